use crate::Algorithm;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("{algorithm} checksum mismatch, expected {expected}, got {actual}")]
    Mismatch {
        algorithm: Algorithm,
        expected:  String,
        actual:    String,
    },

    #[error("Not finished yet")]
    NotFinished,
}

impl VerificationError {
    /// Machine-readable code, stable across message changes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Mismatch { .. } => "ERR_CHECKSUM_MISMATCH",
            Self::NotFinished => "ERR_STREAM_NOT_FINISHED",
        }
    }
}

pub type Result<T> = std::result::Result<T, VerificationError>;
