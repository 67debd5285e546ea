use reqwest::StatusCode;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort (or, for publishing, may abort) a stream batch.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The key lookup returned nothing or failed.
    #[error("could not load API key for API ({api_id})")]
    CredentialUnavailable {
        api_id: String,
        #[source]
        source: Option<BoxError>,
    },

    /// An insert record lacks one of the string attributes we forward.
    #[error("record {index} ({}) is missing string attribute {attribute}", .event_id.as_deref().unwrap_or("no event id"))]
    MalformedRecord {
        index: usize,
        event_id: Option<String>,
        attribute: &'static str,
    },

    #[error("failed to publish message {id}")]
    PublishFailed {
        id: String,
        #[source]
        source: PublishFailure,
    },
}

/// Transport-level outcome of a failed mutation call.
#[derive(Debug, Error)]
pub enum PublishFailure {
    #[error("HTTP status not 2xx: {status} - {body}")]
    Status { status: StatusCode, body: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}
