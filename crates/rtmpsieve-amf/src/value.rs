/// A decoded AMF0 value.
///
/// Object-like composites keep their entries in encoded order. References
/// are resolved during decoding, so a decoded tree never contains an
/// unresolved back-reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Value {
    Number(f64),
    Boolean(bool),
    /// Short and long strings both decode to this variant.
    String(String),
    Object(Vec<(String, Amf0Value)>),
    TypedObject {
        class_name: String,
        entries: Vec<(String, Amf0Value)>,
    },
    /// Associative array. The encoded entry count is advisory and ignored.
    EcmaArray(Vec<(String, Amf0Value)>),
    StrictArray(Vec<Amf0Value>),
    Date {
        /// Milliseconds since the Unix epoch.
        millis: f64,
        /// Timezone offset in minutes.
        timezone: i16,
    },
    XmlDocument(String),
    MovieClip(String),
    Null,
    Undefined,
}

impl Amf0Value {
    /// The string contents, for string-like variants.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Amf0Value::String(s) | Amf0Value::XmlDocument(s) | Amf0Value::MovieClip(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric value, for `Number`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amf0Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}
