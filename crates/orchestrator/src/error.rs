use slotrace_api::{Endpoint, RequestError, ResponseError, TransportError};
use std::time::Duration;
use thiserror::Error;

use crate::Classification;

/// A gateway call that ended without a usable response
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{endpoint} blocked by the platform firewall (HTTP 405)")]
    MethodBlocked { endpoint: Endpoint },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    UnrecognizedStatus {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    #[error("{endpoint} rejected the freight amount")]
    InvalidFreight { endpoint: Endpoint },

    #[error("{endpoint} operation failed: {body}")]
    OperationFailed { endpoint: Endpoint, body: String },

    #[error("{endpoint} returned an unrecognized response: {body}")]
    UnknownFatal { endpoint: Endpoint, body: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("submission throttle closed")]
    ThrottleClosed,
}

impl GatewayError {
    /// Build the error for a fatal classification; `None` for success or congestion
    pub fn from_classification(
        classification: Classification,
        endpoint: Endpoint,
        status: u16,
        body: &str,
    ) -> Option<Self> {
        let body = body.to_string();
        let error = match classification {
            Classification::Success | Classification::RetryableCongestion => return None,
            Classification::MethodBlocked => GatewayError::MethodBlocked { endpoint },
            Classification::UnrecognizedStatus => GatewayError::UnrecognizedStatus {
                endpoint,
                status,
                body,
            },
            Classification::InvalidFreight => GatewayError::InvalidFreight { endpoint },
            Classification::OperationFailed => GatewayError::OperationFailed { endpoint, body },
            Classification::UnknownFatal => GatewayError::UnknownFatal { endpoint, body },
        };
        Some(error)
    }

    /// The classification that ended the call, if the platform answered at all
    pub fn classification(&self) -> Option<Classification> {
        match self {
            GatewayError::MethodBlocked { .. } => Some(Classification::MethodBlocked),
            GatewayError::UnrecognizedStatus { .. } => Some(Classification::UnrecognizedStatus),
            GatewayError::InvalidFreight { .. } => Some(Classification::InvalidFreight),
            GatewayError::OperationFailed { .. } => Some(Classification::OperationFailed),
            GatewayError::UnknownFatal { .. } => Some(Classification::UnknownFatal),
            GatewayError::Transport(_) | GatewayError::ThrottleClosed => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("failed to build request: {0}")]
    Request(#[from] RequestError),

    #[error("unexpected response: {0}")]
    Response(#[from] ResponseError),

    #[error("address book has no usable delivery address")]
    NoAddress,
}

impl SessionError {
    pub fn classification(&self) -> Option<Classification> {
        match self {
            SessionError::Gateway(e) => e.classification(),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RaceError {
    #[error("no submission succeeded across {attempts} attempts: {last_error}")]
    NoWinner { attempts: usize, last_error: String },
}

/// Why a flow cycle ended without a won slot
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("no valid products in the cart")]
    NoValidProduct,

    #[error("no reservation window is open")]
    NoReserveTime,

    #[error("freight amount rejected for the reservation window")]
    InvalidFreight,

    #[error("{step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: SessionError,
    },

    #[error(transparent)]
    Race(#[from] RaceError),
}

impl FlowError {
    /// Wrap a failed step; a freight rejection is lifted to [`FlowError::InvalidFreight`]
    pub fn step(step: &'static str, source: SessionError) -> Self {
        match source.classification() {
            Some(Classification::InvalidFreight) => FlowError::InvalidFreight,
            _ => FlowError::Step { step, source },
        }
    }

    /// Nothing to race for: retrying this cycle cannot help
    pub fn is_unwinnable(&self) -> bool {
        matches!(
            self,
            FlowError::NoValidProduct | FlowError::NoReserveTime | FlowError::InvalidFreight
        )
    }

    /// Metric label
    pub fn label(&self) -> &'static str {
        if self.is_unwinnable() {
            "unwinnable"
        } else {
            "error"
        }
    }
}

/// Terminal outcome of a supervised run other than a win
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("run time limit of {0:?} reached without a won slot")]
    Timeout(Duration),

    #[error("stopped: {0}")]
    Fatal(FlowError),
}
