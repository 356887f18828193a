//! Device settings synchronization
//!
//! After a camera becomes reachable its current operating values are read
//! back so the consuming layer starts from reality instead of defaults. The
//! synchronizer issues a fixed batch of inquiries and collects the answers
//! into a [`DeviceStateSnapshot`]. Individual inquiry failures are tolerated:
//! the affected field stays `None` and the rest of the snapshot is still
//! published. The snapshot is built off to the side and swapped in with a
//! single write, so readers never observe a half-updated state.

use crate::error::Result;
use crate::protocol::client::ViscaClient;
use crate::protocol::command::{ExposureMode, FocusMode, WhiteBalanceMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Point-in-time view of a camera's operating values
///
/// `None` means the value could not be read during the last synchronization,
/// not that the camera lacks the feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStateSnapshot {
    pub focus_mode: Option<FocusMode>,
    pub exposure_mode: Option<ExposureMode>,
    pub iris: Option<u16>,
    pub shutter: Option<u16>,
    pub gain: Option<u16>,
    pub brightness: Option<u16>,
    pub white_balance_mode: Option<WhiteBalanceMode>,
    pub red_gain: Option<u16>,
    pub blue_gain: Option<u16>,
    pub backlight: Option<bool>,
}

impl DeviceStateSnapshot {
    /// True when every field was read successfully
    pub fn is_complete(&self) -> bool {
        self.focus_mode.is_some()
            && self.exposure_mode.is_some()
            && self.iris.is_some()
            && self.shutter.is_some()
            && self.gain.is_some()
            && self.brightness.is_some()
            && self.white_balance_mode.is_some()
            && self.red_gain.is_some()
            && self.blue_gain.is_some()
            && self.backlight.is_some()
    }

    /// True when not a single field was read; the camera is effectively
    /// unreachable even if an earlier probe succeeded
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Holds the published snapshot for one camera and refreshes it on demand
#[derive(Debug, Clone, Default)]
pub struct SettingsSync {
    snapshot: Arc<RwLock<DeviceStateSnapshot>>,
}

impl SettingsSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently published snapshot
    pub async fn snapshot(&self) -> DeviceStateSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Run the full inquiry batch and publish the result atomically
    ///
    /// A failed inquiry leaves its field `None` and is logged; the batch
    /// itself never fails. Returns the snapshot that was published.
    pub async fn refresh(&self, client: &ViscaClient) -> DeviceStateSnapshot {
        let next = DeviceStateSnapshot {
            focus_mode: field("focus_mode", client.query_focus_mode().await),
            exposure_mode: field("exposure_mode", client.query_exposure_mode().await),
            iris: field("iris", client.query_iris().await),
            shutter: field("shutter", client.query_shutter().await),
            gain: field("gain", client.query_gain().await),
            brightness: field("brightness", client.query_brightness().await),
            white_balance_mode: field(
                "white_balance_mode",
                client.query_white_balance_mode().await,
            ),
            red_gain: field("red_gain", client.query_red_gain().await),
            blue_gain: field("blue_gain", client.query_blue_gain().await),
            backlight: field("backlight", client.query_backlight().await),
        };

        debug!(
            addr = %client.addr(),
            complete = next.is_complete(),
            "settings snapshot refreshed"
        );
        *self.snapshot.write().await = next.clone();
        next
    }

    /// Clear the published snapshot (used when a camera disconnects)
    pub async fn clear(&self) {
        *self.snapshot.write().await = DeviceStateSnapshot::default();
    }
}

fn field<T>(name: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(field = name, error = %e, "settings inquiry failed");
            None
        }
    }
}
