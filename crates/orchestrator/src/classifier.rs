use serde_json::Value;
use slotrace_api::{response_code, response_message, RawResponse};
use std::fmt;

/// Outcome of a single remote call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Remote code 0
    Success,
    /// Server-side contention; retried after a backoff
    RetryableCongestion,
    /// HTTP 405, the platform firewall refused the request
    MethodBlocked,
    /// Any other non-200 HTTP status
    UnrecognizedStatus,
    /// Remote code 5003: the freight amount no longer matches the window
    InvalidFreight,
    /// Remote code -1
    OperationFailed,
    /// A code outside the table, or no numeric code at all
    UnknownFatal,
}

/// Remote codes signalling congestion
pub const CONGESTION_CODES: [i64; 4] = [1, -3000, -3001, -3100];

pub const INVALID_FREIGHT_CODE: i64 = 5003;

pub const OPERATION_FAILED_CODE: i64 = -1;

const HTTP_OK: u16 = 200;
const HTTP_METHOD_NOT_ALLOWED: u16 = 405;

/// Map an HTTP status and the body's `code` to a [`Classification`]
pub fn classify(status: u16, code: Option<i64>) -> Classification {
    if status == HTTP_METHOD_NOT_ALLOWED {
        return Classification::MethodBlocked;
    }
    if status != HTTP_OK {
        return Classification::UnrecognizedStatus;
    }

    match code {
        Some(0) => Classification::Success,
        Some(code) if CONGESTION_CODES.contains(&code) => Classification::RetryableCongestion,
        Some(INVALID_FREIGHT_CODE) => Classification::InvalidFreight,
        Some(OPERATION_FAILED_CODE) => Classification::OperationFailed,
        _ => Classification::UnknownFatal,
    }
}

impl Classification {
    pub fn is_success(&self) -> bool {
        matches!(self, Classification::Success)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Classification::RetryableCongestion)
    }

    pub fn is_fatal(&self) -> bool {
        !self.is_success() && !self.is_retryable()
    }

    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Success => "success",
            Classification::RetryableCongestion => "congestion",
            Classification::MethodBlocked => "method_blocked",
            Classification::UnrecognizedStatus => "unrecognized_status",
            Classification::InvalidFreight => "invalid_freight",
            Classification::OperationFailed => "operation_failed",
            Classification::UnknownFatal => "unknown",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A classified response, with the body when it parsed as JSON
#[derive(Clone, Debug, PartialEq)]
pub struct Verdict {
    pub classification: Classification,
    pub code: Option<i64>,
    pub body: Option<Value>,
}

impl Verdict {
    /// Message the platform attached, if any
    pub fn message(&self) -> &str {
        self.body
            .as_ref()
            .and_then(response_message)
            .unwrap_or_default()
    }
}

/// Classifies raw responses, reading the `code` lazily from the body
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseClassifier;

impl ResponseClassifier {
    pub fn classify(&self, response: &RawResponse) -> Classification {
        self.inspect(response).classification
    }

    /// Classify and keep what was parsed along the way
    pub fn inspect(&self, response: &RawResponse) -> Verdict {
        if response.status != HTTP_OK {
            return Verdict {
                classification: classify(response.status, None),
                code: None,
                body: None,
            };
        }
        let body = response.json().ok();
        let code = body.as_ref().and_then(response_code);
        Verdict {
            classification: classify(response.status, code),
            code,
            body,
        }
    }
}
