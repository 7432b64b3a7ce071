use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::app::types::{App, InputMode};
use crate::app_event::AppEvent;
use crate::bridge::{check_devices, CommandRunner, DeviceStatus};
use crate::config::AppConfig;
use crate::error::BridgeError;
use crate::session::{Applied, DeviceSession, DirEntry, ReloadOutcome, ReloadRequest, Side};
use crate::status::StatusBoard;
use crate::transfer::{
    format_bytes, unit_for_total_bytes, CancelHandle, CopyDirection, TransferEvent, TransferJob,
    TransferOrchestrator, TransferPhase, TransferSummary,
};

impl App {
    pub fn new(config: AppConfig, config_path: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            active_panel: Side::Local,
            help_scroll_position: 0,

            session: DeviceSession::new((&config).into()),
            status: StatusBoard::new(config.message_duration()),
            is_checking_devices: false,
            config,
            config_path,
            runner,

            event_tx,
            event_rx,

            transfer_phase: TransferPhase::Idle,
            transfer_rx: None,
            transfer_cancel: None,
            transfer_progress: None,
            transfer_skipped: Vec::new(),
        }
    }

    /// Initial local listing plus a device check, as on launch.
    pub fn start(&mut self) {
        self.reload_side(Side::Local);
        self.check_devices(false);
    }

    pub fn switch_panel(&mut self) {
        self.active_panel = self.active_panel.other();
    }

    pub fn is_transferring(&self) -> bool {
        matches!(
            self.transfer_phase,
            TransferPhase::Planning | TransferPhase::Transferring
        )
    }

    pub fn reload_side(&mut self, side: Side) {
        match self.session.reload(side) {
            Ok(request) => self.spawn_reload(request),
            Err(e) => self.status.error(e.to_string()),
        }
    }

    /// Read the listing off the UI thread and report back through the event channel.
    fn spawn_reload(&self, request: ReloadRequest) {
        let runner = Arc::clone(&self.runner);
        let tx = self.event_tx.clone();
        let debounce = self.config.reload_debounce();
        let side = request.side();

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            match tokio::task::spawn_blocking(move || request.execute(runner.as_ref())).await {
                Ok(outcome) => {
                    if tx.send(AppEvent::Reloaded(outcome)).is_err() {
                        debug!("UI gone, dropping {} listing", side);
                    }
                }
                Err(e) => error!("{} listing task failed: {}", side, e),
            }
        });
    }

    pub fn check_devices(&mut self, then_load: bool) {
        if self.is_checking_devices {
            return;
        }
        self.is_checking_devices = true;
        self.status.info("Checking devices...");

        let runner = Arc::clone(&self.runner);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            match tokio::task::spawn_blocking(move || check_devices(runner.as_ref())).await {
                Ok(result) => {
                    let _ = tx.send(AppEvent::DevicesChecked { result, then_load });
                }
                Err(e) => error!("Device check task failed: {}", e),
            }
        });
    }

    /// Enter on the row under the cursor.
    pub fn open_selected(&mut self) {
        let side = self.active_panel;
        let Some(entry) = self.session.panel(side).current().cloned() else {
            return;
        };
        self.navigate(side, &entry);
    }

    pub fn go_parent(&mut self) {
        self.navigate(self.active_panel, &DirEntry::parent());
    }

    fn navigate(&mut self, side: Side, entry: &DirEntry) {
        match self.session.navigate(side, entry) {
            Ok(Some(request)) => self.spawn_reload(request),
            Ok(None) => {}
            Err(e) => self.status.error(e.to_string()),
        }
    }

    pub fn toggle_selection(&mut self) {
        let panel = self.session.panel_mut(self.active_panel);
        if panel.toggle_current() {
            panel.move_down();
        }
    }

    /// Copy the active panel's selection to the other side.
    pub fn start_copy(&mut self) {
        if self.is_transferring() {
            self.status.error("A copy is already running");
            return;
        }
        if let Err(e) = self.session.ensure_device_ready() {
            self.status.error(e.to_string());
            return;
        }

        let source = self.active_panel;
        if !self.session.panel(source).has_selection() {
            self.status.info("Select files to copy first");
            return;
        }
        let selected = self.session.panel(source).selected();

        let job = TransferJob {
            direction: CopyDirection::from_source(source),
            selected,
            local_dir: self.session.local_path().clone(),
            remote_dir: self.session.remote_path().to_string(),
        };
        info!(
            "Starting {} of {} item(s)",
            job.direction.verb(),
            job.selected.len()
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancelHandle::default();
        self.transfer_rx = Some(rx);
        self.transfer_cancel = Some(cancel.clone());
        self.transfer_progress = None;
        self.transfer_skipped.clear();
        self.transfer_phase = TransferPhase::Planning;
        self.status.sticky("Preparing copy...");

        let orchestrator =
            TransferOrchestrator::new(Arc::clone(&self.runner), self.config.transfer.clone());
        tokio::spawn(async move {
            orchestrator.run(job, tx, cancel).await;
        });
    }

    pub fn cancel_copy(&mut self) {
        if let Some(cancel) = &self.transfer_cancel {
            cancel.cancel();
            self.status.sticky("Cancelling after the current file...");
        }
    }

    /// Apply everything background tasks reported since the last frame.
    pub fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                AppEvent::Reloaded(outcome) => self.handle_reloaded(outcome),
                AppEvent::DevicesChecked { result, then_load } => {
                    self.handle_devices_checked(result, then_load)
                }
            }
        }

        let mut transfer_events = Vec::new();
        if let Some(rx) = &mut self.transfer_rx {
            while let Ok(event) = rx.try_recv() {
                transfer_events.push(event);
            }
        }
        for event in transfer_events {
            self.handle_transfer_event(event);
        }

        self.status.tick(Instant::now());
    }

    fn handle_reloaded(&mut self, outcome: ReloadOutcome) {
        let side = outcome.side();
        match self.session.apply(outcome) {
            Applied::Loaded(side) => debug!("{} listing applied", side),
            Applied::Stale => {}
            Applied::Failed { error, retry } => {
                self.status.error(error.to_string());
                if let Some(request) = retry {
                    self.spawn_reload(request);
                }
            }
        }

        match self.session.take_queued_reload(side) {
            Some(Ok(request)) => self.spawn_reload(request),
            Some(Err(e)) => debug!("Dropping queued {} reload: {}", side, e),
            None => {}
        }
    }

    fn handle_devices_checked(
        &mut self,
        result: Result<DeviceStatus, BridgeError>,
        then_load: bool,
    ) {
        self.is_checking_devices = false;
        match result {
            Ok(status) => {
                let ready = status.is_ready();
                if ready {
                    self.status.success(status.message());
                } else {
                    self.status.error(status.message());
                }
                self.session.set_device_status(status);
                if ready && then_load {
                    self.reload_side(Side::Remote);
                }
            }
            Err(e) => {
                self.session.set_device_status(DeviceStatus::NoDevice);
                self.status.error(format!("adb Error: {}", e));
            }
        }
    }

    fn handle_transfer_event(&mut self, event: TransferEvent) {
        match event {
            TransferEvent::Skipped { name, reason } => {
                info!("Skipped {}: {}", name, reason);
                self.status.error(reason);
                self.transfer_skipped.push(name);
            }
            TransferEvent::Planned { files, total_bytes } => {
                self.transfer_phase = TransferPhase::Transferring;
                let mut text = format!(
                    "Copying {} item(s), {}",
                    files,
                    format_bytes(total_bytes, unit_for_total_bytes(total_bytes))
                );
                if !self.transfer_skipped.is_empty() {
                    text.push_str(&format!(", skipping {}", self.transfer_skipped.join(", ")));
                }
                self.status.sticky(text);
            }
            TransferEvent::Copying { name } => self.status.sticky(format!("Copying {}...", name)),
            TransferEvent::Copied { name } => self.status.success(format!("Copied {}", name)),
            TransferEvent::Failed { name, message } => {
                self.status.error(format!("{}: {}", name, message))
            }
            TransferEvent::Progress(snapshot) => {
                if self.is_transferring() {
                    self.transfer_progress = Some(snapshot);
                }
            }
            TransferEvent::Finished(summary) => self.finish_transfer(summary),
        }
    }

    fn finish_transfer(&mut self, summary: TransferSummary) {
        self.transfer_phase = TransferPhase::Completed;
        self.transfer_rx = None;
        self.transfer_cancel = None;
        self.transfer_progress = None;

        let mut text = format!(
            "{} copied, {} failed, {} skipped",
            summary.copied, summary.failed, summary.skipped
        );
        let skipped = std::mem::take(&mut self.transfer_skipped);
        if !skipped.is_empty() {
            text.push_str(&format!(" ({})", skipped.join(", ")));
        }
        if summary.cancelled {
            text.push_str(", cancelled");
        }
        if summary.failed > 0 || summary.skipped > 0 {
            self.status.error(text);
        } else {
            self.status.success(text);
        }

        // a listing already in flight may predate the last copied file
        for side in [Side::Local, Side::Remote] {
            match self.session.reload_or_queue(side) {
                Ok(Some(request)) => self.spawn_reload(request),
                Ok(None) => {}
                Err(e) => debug!("Skipping post-copy reload of {}: {}", side, e),
            }
        }
    }
}
