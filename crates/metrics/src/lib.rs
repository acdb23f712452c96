//! Metrics and log initialisation for slotrace
//!
//! Counters cover every remote call the gateway makes, congestion retries,
//! race attempts and wins, and refresh daemon activity. There is no scrape
//! endpoint: the process is short-lived, so the binary renders the registry
//! into its log on exit.
//!
//! # Example
//!
//! ```no_run
//! use slotrace_metrics::{init_tracing, MetricsCollector};
//!
//! init_tracing("info", false).unwrap();
//!
//! let collector = MetricsCollector::new();
//! collector.record_race_attempt();
//! println!("{}", collector.render().unwrap());
//! ```

pub mod collector;
pub mod metrics;
pub mod tracing;

pub use collector::{MetricsCollector, MetricsError};
pub use tracing::{init_tracing, TracingError};
