//! Everything that talks to the device goes through the `adb` bridge tool.

mod devices;
mod executor;
mod listing;
mod resolver;
mod shell;
mod size;

#[cfg(test)]
pub mod fake;

pub use devices::{check_devices, DeviceStatus};
pub use executor::{AdbBridge, BridgeOutput, CommandRunner};
pub use listing::parse_listing;
pub use resolver::resolve_remote_path;
pub use shell::{join_remote, remote_parent, shell_safe};
pub use size::{local_exists, local_size, remote_exists, remote_size};
