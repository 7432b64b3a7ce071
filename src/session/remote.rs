use tracing::{debug, warn};

use super::entry::DirEntry;
use crate::bridge::{
    parse_listing, resolve_remote_path, shell_safe, BridgeOutput, CommandRunner,
};
use crate::error::SessionError;

/// A device directory as read by one reload: where it really lives and the
/// raw (unsorted, no `..`) entries.
#[derive(Debug, Clone)]
pub struct RemoteListing {
    pub resolved: String,
    pub entries: Vec<DirEntry>,
}

/// Resolve `path` through its symlinks, then `ls -la` the result.
pub fn read_remote_directory(
    runner: &dyn CommandRunner,
    path: &str,
) -> Result<RemoteListing, SessionError> {
    let resolved = resolve_remote_path(runner, path)?;

    let command = format!("ls -la {}", shell_safe(&resolved));
    let output = runner
        .shell_lenient(&command)
        .map_err(|source| SessionError::RemoteListing {
            path: resolved.clone(),
            source,
        })?;

    let entries = listing_entries(&resolved, &command, output)?;
    debug!("Read {} device entries from {}", entries.len(), resolved);
    Ok(RemoteListing { resolved, entries })
}

/// `ls` exits non-zero when any child is unreadable; whatever it did print
/// still counts. Only a failed run with nothing parseable is an error.
fn listing_entries(
    resolved: &str,
    command: &str,
    output: BridgeOutput,
) -> Result<Vec<DirEntry>, SessionError> {
    let entries = parse_listing(&output.text);
    if output.success() {
        return Ok(entries);
    }
    if !entries.is_empty() {
        warn!(
            "ls of {} exited with {:?}, keeping {} entries",
            resolved,
            output.code,
            entries.len()
        );
        return Ok(entries);
    }

    let args = ["shell".to_string(), command.to_string()];
    output
        .into_result(&args)
        .map(|_| entries)
        .map_err(|source| SessionError::RemoteListing {
            path: resolved.to_string(),
            source,
        })
}
