use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid source document: {0}")]
    InvalidSource(String),
    #[error("research query '{query}' failed: {message}")]
    ResearchQuery { query: String, message: String },
    #[error("delegated backend failed: {0}")]
    Backend(String),
    #[error("no convertible workflow JSON in backend result")]
    ResultUnparseable,
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
