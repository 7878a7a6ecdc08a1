// src/error.rs
//! Error taxonomy shared by the publication pipeline and the intake boundary.

/// Pipeline error.
///
/// Each variant maps to one failure class: configuration problems are fatal
/// before any I/O, persistence and delivery problems abort or degrade a run,
/// validation problems never leave the intake boundary.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Persistence(format!("json: {e}"))
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Delivery(format!("webhook timed out: {e}"))
        } else {
            Self::Delivery(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
