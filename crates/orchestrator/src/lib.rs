//! Slot race engine
//!
//! A [`ProcessSupervisor`] runs [`FlowSequencer`] cycles (cart, selection,
//! capacity probe, order check, window discovery) and hands every open
//! reservation window to the [`SlotRaceCoordinator`], which submits one order
//! per window through the [`ExecutionGateway`]. [`RefreshDaemon`]s keep the
//! session and its prebuilt requests fresh in the background. All of them
//! share one [`RaceControl`] handle for the stop flag, the single-start
//! guards, the win and failure signals, and the daily start gate.

pub mod classifier;
pub mod control;
pub mod daemon;
pub mod error;
pub mod flow;
pub mod gate;
pub mod gateway;
pub mod race;
pub mod session;
pub mod settings;
pub mod supervisor;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use classifier::{classify, Classification, ResponseClassifier, Verdict};
pub use control::{DaemonKey, RaceControl, RaceOutcome, RaceSignals, RaceWin};
pub use daemon::{Cadence, DaemonSet, RefreshDaemon};
pub use error::{FlowError, GatewayError, RaceError, SessionError, SupervisorError};
pub use flow::FlowSequencer;
pub use gate::{LaunchSchedule, StartGate};
pub use gateway::ExecutionGateway;
pub use race::{RaceReport, SlotRaceCoordinator};
pub use session::{Session, SessionOptions, SessionState};
pub use settings::RaceSettings;
pub use supervisor::ProcessSupervisor;
