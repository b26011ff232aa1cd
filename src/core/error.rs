use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AliasError {
    /// The persistence framework does not map this class.
    #[error("Class '{0}' is not mapped")]
    UnmanagedType(String),

    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Field access error: {0}")]
    FieldAccess(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Class '{0}' has no registered factory")]
    UnknownClass(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl AliasError {
    pub fn is_unmanaged(&self) -> bool {
        matches!(self, Self::UnmanagedType(_))
    }
}

pub type Result<T> = std::result::Result<T, AliasError>;

impl<T> From<std::sync::PoisonError<T>> for AliasError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for AliasError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(format!("json: {}", err))
    }
}

impl From<rmp_serde::encode::Error> for AliasError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Codec(format!("msgpack encode: {}", err))
    }
}

impl From<rmp_serde::decode::Error> for AliasError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Codec(format!("msgpack decode: {}", err))
    }
}
