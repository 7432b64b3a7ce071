//! Current-path state of the local and device panels.

mod aliases;
mod entry;
mod local;
mod remote;
mod state;

pub use entry::DirEntry;
pub use state::{Applied, DeviceSession, LoadState, ReloadOutcome, ReloadRequest, Side};
