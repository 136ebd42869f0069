use thiserror::Error;

pub type WizardResult<T> = Result<T, WizardError>;

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field `{field}` expects a {expected} value")]
    ValueMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Index {index} is outside the {scale} scale ({min}..={max})")]
    ScaleOutOfRange {
        scale: &'static str,
        index: u8,
        min: u8,
        max: u8,
    },

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tenant `{client}` unavailable: {reason}")]
    TenantUnavailable { client: String, reason: String },

    #[error("Wizard session is closed")]
    SessionClosed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
