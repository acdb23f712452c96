use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("failed to build http client: {0}")]
    ClientBuild(String),

    #[error("request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("failed to read response body from {endpoint}: {reason}")]
    BodyRead { endpoint: String, reason: String },
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request needs a delivery address but none is chosen")]
    MissingAddress,

    #[error("failed to encode {field}: {source}")]
    Encode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response body is not JSON: {0}")]
    NotJson(String),

    #[error("response has no {0}")]
    MissingField(&'static str),

    #[error("malformed {field}: {reason}")]
    Malformed { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no notification key configured")]
    MissingKey,

    #[error("invalid notification url: {0}")]
    InvalidUrl(String),

    #[error("notification request failed: {0}")]
    RequestFailed(String),

    #[error("notification rejected with HTTP {status}")]
    Rejected { status: u16 },
}
