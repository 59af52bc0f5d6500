use thiserror::Error;

/// Errors surfaced by batch dispatch, pricing, and the completion client.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Client or request configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The HTTP request could not be sent or completed.
    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The completion service answered with a non-success status.
    #[error("{message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    /// The service response could not be decoded.
    #[error("{message}")]
    Parse {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// One call in a dispatched batch failed; the whole batch is abandoned
    /// without partial results.
    #[error("Completion call for batch entry {index} failed")]
    Completion {
        index: usize,
        #[source]
        source: Box<LlmError>,
    },

    /// A completion result lacks the metadata needed to compute its cost.
    #[error("Cannot price completion: {message}")]
    Pricing { message: String },

    /// A completion result is structurally unusable for text extraction.
    /// Never escapes [`crate::batch::extract_text`], which logs it and
    /// degrades to empty strings instead.
    #[error("Malformed completion result: {0}")]
    Extraction(String),
}
