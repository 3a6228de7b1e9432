use std::io::IsTerminal;

use clap::ValueEnum;

/// How report output on stdout is rendered.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    /// Tables for humans on a terminal, JSON for pipes.
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}
