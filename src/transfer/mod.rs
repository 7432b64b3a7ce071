//! Multi-file copies between the two panels through `adb push`/`adb pull`.

mod orchestrator;
mod plan;
mod progress;

pub use orchestrator::{
    CancelHandle, TransferEvent, TransferJob, TransferOrchestrator, TransferPhase, TransferSummary,
};
pub use plan::CopyDirection;
pub use progress::{format_bytes, format_clock, unit_for_total_bytes, ProgressSnapshot, SpeedPolicy};
