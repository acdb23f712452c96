use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::WINDOW_TIME_FORMAT;

/// Start/end pair of a reservation window (Unix seconds)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowBounds {
    pub start_timestamp: i64,
    pub end_timestamp: i64,
}

impl WindowBounds {
    pub fn new(start_timestamp: i64, end_timestamp: i64) -> Self {
        Self {
            start_timestamp,
            end_timestamp,
        }
    }

    pub fn is_unbound(&self) -> bool {
        self.start_timestamp == 0 && self.end_timestamp == 0
    }

    /// Human-readable `start ~ end` range in local time
    pub fn label(&self) -> String {
        format!(
            "{} ~ {}",
            format_timestamp(self.start_timestamp),
            format_timestamp(self.end_timestamp)
        )
    }
}

/// An open delivery reservation window returned by slot discovery
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveTime {
    pub start_timestamp: i64,
    pub end_timestamp: i64,

    /// Label the platform shows for this window
    #[serde(default)]
    pub select_msg: String,
}

impl ReserveTime {
    pub fn new(start_timestamp: i64, end_timestamp: i64, select_msg: impl Into<String>) -> Self {
        Self {
            start_timestamp,
            end_timestamp,
            select_msg: select_msg.into(),
        }
    }

    pub fn bounds(&self) -> WindowBounds {
        WindowBounds::new(self.start_timestamp, self.end_timestamp)
    }

    pub fn label(&self) -> String {
        self.bounds().label()
    }
}

fn format_timestamp(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(at) => at.format(WINDOW_TIME_FORMAT).to_string(),
        None => ts.to_string(),
    }
}
