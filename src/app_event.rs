use crate::bridge::DeviceStatus;
use crate::error::BridgeError;
use crate::session::ReloadOutcome;

/// Results of background work, delivered to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    Reloaded(ReloadOutcome),
    DevicesChecked {
        result: Result<DeviceStatus, BridgeError>,
        /// Load the device panel when the check comes back ready.
        then_load: bool,
    },
}
