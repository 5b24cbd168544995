//! Error types for the posture model

/// Errors parsing or constructing a [`Period`](crate::Period)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    /// Not in `YYYY-MM` form
    #[error("invalid period '{0}': expected YYYY-MM")]
    InvalidFormat(String),

    /// Month outside 1-12
    #[error("month out of range: {0}")]
    MonthOutOfRange(u8),
}

/// Errors computing a [`Fingerprint`](crate::Fingerprint)
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    /// Invalid digest length
    #[error("invalid fingerprint length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex decoding failed
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Canonical encoding failed
    #[error("canonical encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}
