use std::path::Path;

use tracing::{debug, warn};

use crate::bridge::{
    join_remote, local_exists, local_size, remote_exists, remote_size, CommandRunner,
};
use crate::error::TransferError;
use crate::session::{DirEntry, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyDirection {
    /// Local machine to device (`adb push`).
    Push,
    /// Device to local machine (`adb pull`).
    Pull,
}

impl CopyDirection {
    /// Copies always go from the given panel to the other one.
    pub fn from_source(side: Side) -> Self {
        match side {
            Side::Local => CopyDirection::Push,
            Side::Remote => CopyDirection::Pull,
        }
    }

    pub fn source_side(self) -> Side {
        match self {
            CopyDirection::Push => Side::Local,
            CopyDirection::Pull => Side::Remote,
        }
    }

    pub fn destination_side(self) -> Side {
        self.source_side().other()
    }

    pub fn verb(self) -> &'static str {
        match self {
            CopyDirection::Push => "push",
            CopyDirection::Pull => "pull",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub name: String,
    pub source: String,
    pub destination: String,
    pub size: u64,
}

impl PlanEntry {
    pub fn bridge_args(&self, direction: CopyDirection) -> Vec<String> {
        vec![
            direction.verb().to_string(),
            self.source.clone(),
            self.destination.clone(),
        ]
    }
}

/// An entry left out of the plan, with the reason.
#[derive(Debug)]
pub struct Skipped {
    pub name: String,
    pub reason: TransferError,
}

#[derive(Debug, Default)]
pub struct CopyPlan {
    pub entries: Vec<PlanEntry>,
    pub skipped: Vec<Skipped>,
    pub total_bytes: u64,
}

impl CopyPlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Existence and size questions about either side.
pub struct Probe<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Probe<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub fn exists(&self, side: Side, path: &str) -> Result<bool, TransferError> {
        match side {
            Side::Local => Ok(local_exists(Path::new(path))),
            Side::Remote => Ok(remote_exists(self.runner, path)?),
        }
    }

    pub fn size(&self, side: Side, path: &str) -> Result<u64, TransferError> {
        match side {
            Side::Local => Ok(local_size(Path::new(path))),
            Side::Remote => Ok(remote_size(self.runner, path)?),
        }
    }

    /// Bytes already written across all destinations of `plan`.
    pub fn copied_bytes(&self, plan: &[PlanEntry], direction: CopyDirection) -> u64 {
        let side = direction.destination_side();
        plan.iter()
            .map(|entry| match self.size(side, &entry.destination) {
                Ok(size) => size,
                Err(e) => {
                    debug!("size poll of {} failed: {}", entry.destination, e);
                    0
                }
            })
            .sum()
    }
}

/// Work out source/destination pairs for the selected rows, skipping any
/// whose destination already exists, and size the sources.
pub fn build_plan(
    runner: &dyn CommandRunner,
    direction: CopyDirection,
    selected: &[DirEntry],
    local_dir: &Path,
    remote_dir: &str,
) -> CopyPlan {
    let probe = Probe::new(runner);
    let mut plan = CopyPlan::default();

    for entry in selected.iter().filter(|e| e.is_selectable()) {
        let local = local_dir.join(&entry.name).to_string_lossy().to_string();
        let remote = join_remote(remote_dir, &entry.name);
        let (source, destination) = match direction {
            CopyDirection::Push => (local, remote),
            CopyDirection::Pull => (remote, local),
        };

        match probe.exists(direction.destination_side(), &destination) {
            Ok(false) => {}
            Ok(true) => {
                plan.skipped.push(Skipped {
                    name: entry.name.clone(),
                    reason: TransferError::DestinationAlreadyExists(destination),
                });
                continue;
            }
            Err(reason) => {
                plan.skipped.push(Skipped {
                    name: entry.name.clone(),
                    reason,
                });
                continue;
            }
        }

        let size = probe
            .size(direction.source_side(), &source)
            .unwrap_or_else(|e| {
                warn!("Could not size {}: {}", source, e);
                0
            });
        plan.total_bytes += size;
        plan.entries.push(PlanEntry {
            name: entry.name.clone(),
            source,
            destination,
            size,
        });
    }

    debug!(
        "Planned {} of {} selected, {} bytes",
        plan.entries.len(),
        selected.len(),
        plan.total_bytes
    );
    plan
}
