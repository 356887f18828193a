//! Per-camera connection lifecycle
//!
//! - [`state`]: lifecycle states and the per-camera record
//! - [`machine`]: the supervising state machine (probe, settings sync,
//!   watchdog, failure escalation)

pub mod machine;
pub mod state;

pub use machine::{CameraConnection, MAX_PROBE_ATTEMPTS, WATCHDOG_TIMEOUT};
pub use state::{ConnectionRecord, ConnectionState};
