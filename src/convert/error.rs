//! Error types for document conversion.

/// Errors that abort a conversion update.
///
/// Missing references and unsupported feature variants are recovered
/// locally with a logged diagnostic; only true decode failures surface
/// here.
#[derive(Debug)]
pub enum ConvertError {
    /// Failed to parse the interchange document.
    Parse(serde_json::Error),
    /// Failed to read an external buffer or image file.
    Io(std::io::Error),
    /// Failed to decode a buffer payload.
    Decode(String),
    /// A buffer byte range is out of bounds.
    BufferRange {
        /// Buffer id in the document.
        buffer: String,
        /// Requested end of the range.
        end: usize,
        /// Total decoded length of the buffer.
        len: usize,
    },
    /// Error reading accessor data.
    Accessor(String),
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "document parse error: {e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Decode(msg) => write!(f, "buffer decode error: {msg}"),
            Self::BufferRange { buffer, end, len } => {
                write!(
                    f,
                    "range ending at byte {end} exceeds buffer '{buffer}' of {len} bytes"
                )
            }
            Self::Accessor(msg) => write!(f, "accessor error: {msg}"),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

impl From<std::io::Error> for ConvertError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
