use std::fmt;

use tracing::info;

use super::executor::CommandRunner;
use crate::error::BridgeError;

/// What `adb devices` says about the attached hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Exactly one authorized device.
    Ready { serial: String },
    NoDevice,
    /// More than one authorized device; the bridge would need `-s`.
    MultipleDevices,
    /// Only unauthorized devices are attached.
    UnauthorizedOnly,
}

impl DeviceStatus {
    /// Loading and copying are only allowed against a single ready device.
    pub fn is_ready(&self) -> bool {
        matches!(self, DeviceStatus::Ready { .. })
    }

    pub fn message(&self) -> String {
        match self {
            DeviceStatus::Ready { serial } => format!("OK, ready to load files from {}", serial),
            DeviceStatus::NoDevice => "No device found".to_string(),
            DeviceStatus::MultipleDevices => {
                "Multiple authorized devices found, connect only one".to_string()
            }
            DeviceStatus::UnauthorizedOnly => {
                "No authorized device found, accept the USB debugging prompt".to_string()
            }
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Classify `adb devices` output. The first non-empty line is the header.
pub fn classify_devices(output: &str) -> DeviceStatus {
    let mut authorized = Vec::new();
    let mut unauthorized = 0usize;

    for line in output.lines().filter(|l| !l.trim().is_empty()).skip(1) {
        let mut fields = line.split('\t');
        let serial = fields.next().unwrap_or_default().trim();
        match fields.next().map(str::trim) {
            Some("device") => authorized.push(serial.to_string()),
            Some("unauthorized") => unauthorized += 1,
            _ => {}
        }
    }

    match (authorized.len(), unauthorized) {
        (1, _) => DeviceStatus::Ready {
            serial: authorized.remove(0),
        },
        (0, 0) => DeviceStatus::NoDevice,
        (0, _) => DeviceStatus::UnauthorizedOnly,
        _ => DeviceStatus::MultipleDevices,
    }
}

pub fn check_devices(runner: &dyn CommandRunner) -> Result<DeviceStatus, BridgeError> {
    let output = runner.run(&["devices".to_string()])?;
    let status = classify_devices(&output);
    info!("Device check: {:?}", status);
    Ok(status)
}
