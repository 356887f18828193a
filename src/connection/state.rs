//! Connection lifecycle state types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one camera connection
///
/// Legal transitions: `Idle → Connecting → Connected`, any active state to
/// `Failed` on error, `Failed → Connecting` on explicit reconnect, and any
/// state to `Idle` on disconnect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Not connected and no attempt in progress
    #[default]
    Idle,
    /// Reachability probe and settings synchronization in progress
    Connecting,
    /// Fully established; commands are accepted
    Connected,
    /// A previous attempt or an established connection failed
    Failed,
}

impl ConnectionState {
    /// True only in the state where commands are accepted
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Mutable per-camera connection bookkeeping
///
/// Owned by exactly one `CameraConnection`; every mutation goes through its
/// methods. The generation counter stamps each connection attempt so that
/// watchdog tasks and late completions from a superseded attempt can detect
/// they no longer apply.
#[derive(Debug, Default)]
pub struct ConnectionRecord {
    pub state: ConnectionState,
    /// Human-readable reason for the most recent failure
    pub last_error: Option<String>,
    /// Incremented on every connect/disconnect; stamps watchdog tasks
    pub generation: u64,
    /// Reachability probe attempts used by the current connect
    pub retry_count: u32,
    /// True while a motion command is active and unstopped
    pub driving: bool,
}
