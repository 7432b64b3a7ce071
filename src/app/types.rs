use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::app_event::AppEvent;
use crate::bridge::CommandRunner;
use crate::config::AppConfig;
use crate::session::{DeviceSession, Side};
use crate::status::StatusBoard;
use crate::transfer::{CancelHandle, ProgressSnapshot, TransferEvent, TransferPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Help,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub active_panel: Side,
    pub help_scroll_position: u16,

    pub config: AppConfig,
    pub config_path: PathBuf,
    pub runner: Arc<dyn CommandRunner>,

    pub session: DeviceSession,
    pub status: StatusBoard,
    pub is_checking_devices: bool,

    // Background listing and device results
    pub event_tx: UnboundedSender<AppEvent>,
    pub event_rx: UnboundedReceiver<AppEvent>,

    // Copy batch
    pub transfer_phase: TransferPhase,
    pub transfer_rx: Option<UnboundedReceiver<TransferEvent>>,
    pub transfer_cancel: Option<CancelHandle>,
    pub transfer_progress: Option<ProgressSnapshot>,
    /// Names left out of the running batch because their destination exists.
    pub transfer_skipped: Vec<String>,
}
