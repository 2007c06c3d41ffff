use linkytic_transport::TransportError;

/// Errors surfaced by the frame reader.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte source ended before another complete frame arrived.
    #[error("byte source exhausted (no complete frame)")]
    SourceExhausted,

    /// The byte source failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Why a single dataset was rejected.
///
/// A rejected dataset never aborts its frame; the assembler skips it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    /// Wrong number of fields (checksum field included).
    #[error("malformed dataset ({fields} fields, expected 3 or 4)")]
    Malformed { fields: usize },

    /// Too short to hold a checksum, or no separator before it.
    #[error("dataset has no checksum field")]
    MissingChecksum,

    /// Enclosed checksum differs from the computed one.
    #[error("checksum mismatch on {name}: computed {expected:?}, enclosed {found:?}")]
    ChecksumMismatch {
        name: String,
        expected: char,
        found: char,
    },

    /// Name or value is not valid UTF-8.
    #[error("dataset field is not valid UTF-8")]
    Encoding,

    /// A field to encode contains a framing byte or the field separator.
    #[error("field contains reserved byte 0x{byte:02X}")]
    ReservedByte { byte: u8 },
}

impl DatasetError {
    /// True for structural problems (as opposed to checksum failures).
    pub fn is_malformed(&self) -> bool {
        !matches!(self, DatasetError::ChecksumMismatch { .. })
    }
}

/// Reading an expected attribute out of a decoded frame failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    /// The frame carries no such attribute.
    #[error("attribute {0} missing from frame")]
    Missing(String),

    /// A scalar was expected but the attribute is dated (or vice versa).
    #[error("attribute {0} has an unexpected shape")]
    WrongShape(String),

    /// The value does not parse as an integer.
    #[error("attribute {name} is not an integer: {value:?}")]
    InvalidNumber { name: String, value: String },

    /// The date part is not a valid horodate.
    #[error("attribute {name} has an invalid horodate: {source}")]
    InvalidHorodate {
        name: String,
        source: HorodateError,
    },
}

/// A TIC horodate string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HorodateError {
    /// Horodates are exactly 13 characters.
    #[error("horodate must be 13 characters, got {0}")]
    Length(usize),

    /// Unknown season marker.
    #[error("unknown season marker {0:?}")]
    Season(char),

    /// A numeric field is not made of digits.
    #[error("horodate {field} is not numeric: {value:?}")]
    NotNumeric { field: &'static str, value: String },

    /// A numeric field is out of its calendar range.
    #[error("horodate {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: u32 },
}
