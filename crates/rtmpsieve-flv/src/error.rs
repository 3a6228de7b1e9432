/// Errors that can occur while writing container output.
#[derive(Debug, thiserror::Error)]
pub enum FlvError {
    /// The payload exceeds what a 24-bit tag size field can carry.
    #[error("tag payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while writing a container file.
    #[error("container I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlvError>;
