use thiserror::Error;

/// Main error type for BER codec operations
///
/// The variants follow the failure taxonomy of the codec: schema
/// mismatches and value validation failures are recoverable (logged, the
/// traversal continues with sibling elements), everything else aborts the
/// current encode/decode call.
#[derive(Error, Debug)]
pub enum BerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Length violation: {0}")]
    LengthViolation(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Maximum nesting depth {0} exceeded")]
    DepthExceeded(usize),

    #[error("Resource failure: {0}")]
    Resource(String),

    #[error("ASN.1 encoding error: {0}")]
    Asn1Encoding(String),

    #[error("ASN.1 decoding error: {0}")]
    Asn1Decoding(String),
}

impl BerError {
    /// Whether this error aborts the whole encode/decode call
    ///
    /// Schema mismatches and validation failures only invalidate the
    /// element they occurred in.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BerError::SchemaMismatch(_) | BerError::Validation(_))
    }

    /// Non-zero status code for this error
    pub fn status_code(&self) -> i32 {
        match self {
            BerError::SchemaMismatch(_) => 1,
            BerError::Validation(_) => 2,
            BerError::Asn1Encoding(_) | BerError::Asn1Decoding(_) => 3,
            BerError::LengthViolation(_) => 4,
            BerError::DepthExceeded(_) => 5,
            BerError::InvalidData(_) => 6,
            BerError::Resource(_) => 7,
            BerError::Io(_) => 8,
        }
    }
}

/// Result type alias for BER codec operations
pub type BerResult<T> = Result<T, BerError>;
