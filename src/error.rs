use crate::parser::ParseError;

/// Errors surfaced by editing operations. None of them leave a partial
/// mutation behind.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Malformed model: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Model has no ObjectJsons object")]
    NotAModel,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Validation(String),
    #[error("Cannot find table layouts for {0}")]
    MissingLayout(String),
    #[error("Unknown table: {0}")]
    MissingTable(String),
    #[error("Unknown field {field} on table {table}")]
    UnknownField { table: String, field: String },
    #[error("Another gesture is in progress")]
    GestureInProgress,
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),
}

impl EditorError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
