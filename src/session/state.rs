use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::aliases::RootAliasTracker;
use super::entry::{finish_listing, DirEntry};
use super::local::read_local_directory;
use super::remote::{read_remote_directory, RemoteListing};
use crate::bridge::{join_remote, remote_parent, CommandRunner, DeviceStatus};
use crate::config::AppConfig;
use crate::error::SessionError;

/// Which panel (local or device) an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Local,
    Remote,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Local => Side::Remote,
            Side::Remote => Side::Local,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => f.write_str("Local"),
            Side::Remote => f.write_str("Device"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(String),
}

/// Listing and cursor for one side.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    entries: Vec<DirEntry>,
    cursor: usize,
    state: LoadState,
    generation: u64,
    /// Another reload was asked for while one was in flight.
    reload_pending: bool,
}

impl Panel {
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn reload_pending(&self) -> bool {
        self.reload_pending
    }

    pub fn current(&self) -> Option<&DirEntry> {
        self.entries.get(self.cursor)
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        } else if !self.entries.is_empty() {
            self.cursor = self.entries.len() - 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor < self.entries.len().saturating_sub(1) {
            self.cursor += 1;
        } else {
            self.cursor = 0;
        }
    }

    /// Flip the selection of the row under the cursor. Returns false for rows
    /// that cannot be selected.
    pub fn toggle_current(&mut self) -> bool {
        match self.entries.get_mut(self.cursor) {
            Some(entry) if entry.is_selectable() => {
                entry.is_selected = !entry.is_selected;
                true
            }
            _ => false,
        }
    }

    /// Selected rows in listing order.
    pub fn selected(&self) -> Vec<DirEntry> {
        self.entries
            .iter()
            .filter(|e| e.is_selected && e.is_selectable())
            .cloned()
            .collect()
    }

    pub fn has_selection(&self) -> bool {
        self.entries.iter().any(|e| e.is_selected)
    }

    fn begin(&mut self, side: Side) -> Result<u64, SessionError> {
        if self.is_loading() {
            return Err(SessionError::Busy(side));
        }
        // cleared up front so the stale listing disappears immediately
        self.entries.clear();
        self.cursor = 0;
        self.state = LoadState::Loading;
        self.generation += 1;
        Ok(self.generation)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.is_loading()
    }

    fn loaded(&mut self, entries: Vec<DirEntry>) {
        self.entries = entries;
        self.cursor = 0;
        self.state = LoadState::Loaded;
    }

    fn failed(&mut self, error: &SessionError) {
        self.entries.clear();
        self.cursor = 0;
        self.state = LoadState::Error(error.to_string());
    }
}

#[derive(Debug, Clone)]
pub struct LocalRequest {
    pub generation: u64,
    pub path: PathBuf,
    pub is_retry: bool,
}

#[derive(Debug, Clone)]
pub struct RemoteRequest {
    pub generation: u64,
    pub path: String,
}

/// A listing the session wants read. Run it off the UI thread with
/// [`ReloadRequest::execute`] and hand the outcome back to
/// [`DeviceSession::apply`].
#[derive(Debug, Clone)]
pub enum ReloadRequest {
    Local(LocalRequest),
    Remote(RemoteRequest),
}

impl ReloadRequest {
    pub fn side(&self) -> Side {
        match self {
            ReloadRequest::Local(_) => Side::Local,
            ReloadRequest::Remote(_) => Side::Remote,
        }
    }

    /// Blocking: reads the directory or talks to the bridge.
    pub fn execute(self, runner: &dyn CommandRunner) -> ReloadOutcome {
        match self {
            ReloadRequest::Local(request) => {
                let result = read_local_directory(&request.path);
                ReloadOutcome::Local { request, result }
            }
            ReloadRequest::Remote(request) => {
                let result = read_remote_directory(runner, &request.path);
                ReloadOutcome::Remote { request, result }
            }
        }
    }
}

#[derive(Debug)]
pub enum ReloadOutcome {
    Local {
        request: LocalRequest,
        result: Result<Vec<DirEntry>, SessionError>,
    },
    Remote {
        request: RemoteRequest,
        result: Result<RemoteListing, SessionError>,
    },
}

impl ReloadOutcome {
    pub fn side(&self) -> Side {
        match self {
            ReloadOutcome::Local { .. } => Side::Local,
            ReloadOutcome::Remote { .. } => Side::Remote,
        }
    }
}

#[derive(Debug)]
pub enum Applied {
    Loaded(Side),
    /// A newer reload for the same side superseded this one.
    Stale,
    Failed {
        error: SessionError,
        retry: Option<ReloadRequest>,
    },
}

/// The knobs of [`AppConfig`] the session cares about.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub local_start: PathBuf,
    pub remote_root: String,
    pub show_hidden_files: bool,
    pub browse_above_root: bool,
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            local_start: config.local_start_path.clone(),
            remote_root: config.remote_root.clone(),
            show_hidden_files: config.show_hidden_files,
            browse_above_root: config.browse_above_root,
        }
    }
}

/// Current paths and listings of both sides.
#[derive(Debug)]
pub struct DeviceSession {
    options: SessionOptions,
    local_path: PathBuf,
    /// Always the last successfully resolved form.
    remote_path: String,
    local: Panel,
    remote: Panel,
    aliases: RootAliasTracker,
    device: Option<DeviceStatus>,
}

impl DeviceSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            local_path: options.local_start.clone(),
            remote_path: options.remote_root.clone(),
            local: Panel::default(),
            remote: Panel::default(),
            aliases: RootAliasTracker::new(options.remote_root.clone()),
            device: None,
            options,
        }
    }

    pub fn local_path(&self) -> &PathBuf {
        &self.local_path
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    pub fn panel(&self, side: Side) -> &Panel {
        match side {
            Side::Local => &self.local,
            Side::Remote => &self.remote,
        }
    }

    pub fn panel_mut(&mut self, side: Side) -> &mut Panel {
        match side {
            Side::Local => &mut self.local,
            Side::Remote => &mut self.remote,
        }
    }

    pub fn device_status(&self) -> Option<&DeviceStatus> {
        self.device.as_ref()
    }

    pub fn set_device_status(&mut self, status: DeviceStatus) {
        self.device = Some(status);
    }

    pub fn ensure_device_ready(&self) -> Result<(), SessionError> {
        match &self.device {
            Some(status) if status.is_ready() => Ok(()),
            Some(status) => Err(SessionError::DeviceNotReady(status.clone())),
            None => Err(SessionError::DeviceNotReady(DeviceStatus::NoDevice)),
        }
    }

    /// Re-read the current directory of `side`.
    pub fn reload(&mut self, side: Side) -> Result<ReloadRequest, SessionError> {
        match side {
            Side::Local => self.begin_local(self.local_path.clone(), false),
            Side::Remote => self.begin_remote(self.remote_path.clone()),
        }
    }

    /// Reload `side` now, or queue one for when the listing in flight lands.
    pub fn reload_or_queue(&mut self, side: Side) -> Result<Option<ReloadRequest>, SessionError> {
        if self.panel(side).is_loading() {
            debug!("{} listing in flight, queueing a reload", side);
            self.panel_mut(side).reload_pending = true;
            return Ok(None);
        }
        self.reload(side).map(Some)
    }

    /// The queued reload for `side`, once nothing is in flight there.
    pub fn take_queued_reload(
        &mut self,
        side: Side,
    ) -> Option<Result<ReloadRequest, SessionError>> {
        let panel = self.panel_mut(side);
        if !panel.reload_pending || panel.is_loading() {
            return None;
        }
        panel.reload_pending = false;
        Some(self.reload(side))
    }

    /// Enter a folder or go up via `..`. Plain files do nothing.
    pub fn navigate(
        &mut self,
        side: Side,
        entry: &DirEntry,
    ) -> Result<Option<ReloadRequest>, SessionError> {
        if entry.is_special_action {
            return self.reload(side).map(Some);
        }
        if !entry.is_folder {
            return Ok(None);
        }

        let request = match side {
            Side::Local => {
                let target = if entry.is_parent() {
                    self.local_path
                        .parent()
                        .map(|p| p.to_path_buf())
                        .unwrap_or_else(|| self.local_path.clone())
                } else {
                    self.local_path.join(&entry.name)
                };
                self.begin_local(target, false)?
            }
            Side::Remote => {
                let target = if entry.is_parent() {
                    self.remote_parent_target()
                } else {
                    join_remote(&self.remote_path, &entry.name)
                };
                self.begin_remote(target)?
            }
        };
        Ok(Some(request))
    }

    /// Jump the device side to an arbitrary absolute path.
    pub fn open_remote(&mut self, path: &str) -> Result<ReloadRequest, SessionError> {
        self.begin_remote(path.to_string())
    }

    fn remote_parent_target(&self) -> String {
        if self
            .aliases
            .is_at_or_above_root(&self.remote_path, self.options.browse_above_root)
        {
            debug!("Already at device root {}, staying", self.remote_path);
            self.remote_path.clone()
        } else {
            remote_parent(&self.remote_path)
        }
    }

    fn begin_local(&mut self, path: PathBuf, is_retry: bool) -> Result<ReloadRequest, SessionError> {
        let generation = self.local.begin(Side::Local)?;
        Ok(ReloadRequest::Local(LocalRequest {
            generation,
            path,
            is_retry,
        }))
    }

    fn begin_remote(&mut self, path: String) -> Result<ReloadRequest, SessionError> {
        self.ensure_device_ready()?;
        let generation = self.remote.begin(Side::Remote)?;
        Ok(ReloadRequest::Remote(RemoteRequest { generation, path }))
    }

    /// Fold a finished reload back into the session.
    pub fn apply(&mut self, outcome: ReloadOutcome) -> Applied {
        match outcome {
            ReloadOutcome::Local { request, result } => self.apply_local(request, result),
            ReloadOutcome::Remote { request, result } => self.apply_remote(request, result),
        }
    }

    fn apply_local(
        &mut self,
        request: LocalRequest,
        result: Result<Vec<DirEntry>, SessionError>,
    ) -> Applied {
        if !self.local.is_current(request.generation) {
            debug!("Dropping stale local listing of {}", request.path.display());
            return Applied::Stale;
        }

        match result {
            Ok(entries) => {
                self.local_path = request.path;
                self.local
                    .loaded(finish_listing(entries, self.options.show_hidden_files));
                Applied::Loaded(Side::Local)
            }
            Err(error) => {
                warn!("{}", error);
                self.local.failed(&error);

                let start = self.options.local_start.clone();
                let retry = if request.is_retry || request.path == start {
                    None
                } else {
                    info!("Retrying local listing at {}", start.display());
                    self.local_path = start.clone();
                    self.begin_local(start, true).ok()
                };
                Applied::Failed { error, retry }
            }
        }
    }

    fn apply_remote(
        &mut self,
        request: RemoteRequest,
        result: Result<RemoteListing, SessionError>,
    ) -> Applied {
        if !self.remote.is_current(request.generation) {
            debug!("Dropping stale device listing of {}", request.path);
            return Applied::Stale;
        }

        match result {
            Ok(listing) => {
                if request.path == self.aliases.root() {
                    self.aliases.record_root_resolution(&listing.resolved);
                }
                debug!(
                    "resolved: {} root aliases: {:?}",
                    listing.resolved,
                    self.aliases.aliases()
                );

                let mut entries = listing.entries;
                if self
                    .aliases
                    .offers_parent(&listing.resolved, self.options.browse_above_root)
                {
                    entries.push(DirEntry::parent());
                }
                self.remote_path = listing.resolved;
                self.remote
                    .loaded(finish_listing(entries, self.options.show_hidden_files));
                Applied::Loaded(Side::Remote)
            }
            Err(error) => {
                warn!("{}", error);
                self.remote.failed(&error);
                Applied::Failed { error, retry: None }
            }
        }
    }

    /// Run a reload to completion on the calling thread, following the local
    /// retry if one is issued. Returns the first error when nothing loaded.
    pub fn load_blocking(
        &mut self,
        request: ReloadRequest,
        runner: &dyn CommandRunner,
    ) -> Result<(), SessionError> {
        let mut request = request;
        loop {
            match self.apply(request.execute(runner)) {
                Applied::Loaded(_) | Applied::Stale => return Ok(()),
                Applied::Failed {
                    retry: Some(retry), ..
                } => request = retry,
                Applied::Failed { error, retry: None } => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::fake::FakeBridge;
    use std::fs;

    fn options(start: PathBuf, browse_above_root: bool) -> SessionOptions {
        SessionOptions {
            local_start: start,
            remote_root: "/sdcard".to_string(),
            show_hidden_files: false,
            browse_above_root,
        }
    }

    fn ready_session(browse_above_root: bool) -> DeviceSession {
        let mut session = DeviceSession::new(options(PathBuf::from("/"), browse_above_root));
        session.set_device_status(DeviceStatus::Ready {
            serial: "ABC123".to_string(),
        });
        session
    }

    fn names(panel: &Panel) -> Vec<&str> {
        panel.entries().iter().map(|e| e.name.as_str()).collect()
    }

    const DOWNLOAD_LS: &str = "total 4\n-rw-rw---- 1 root sdcard_rw 10 2024-01-01 10:00 a.apk\n";
    const SDCARD_LS: &str = "total 4\ndrwxrwx--x 2 root sdcard_rw 4096 2024-01-01 10:00 Download\n";

    fn identity_bridge() -> FakeBridge {
        FakeBridge::new()
            .shell("readlink -f '/sdcard'", "/sdcard\n")
            .shell("readlink -f '/sdcard/Download'", "/sdcard/Download\n")
            .shell("ls -la '/sdcard'", SDCARD_LS)
            .shell("ls -la '/sdcard/Download'", DOWNLOAD_LS)
    }

    #[test]
    fn test_going_up_to_root_alias_hides_parent() {
        let bridge = identity_bridge();
        let mut session = ready_session(false);

        let request = session.reload(Side::Remote).unwrap();
        session.load_blocking(request, &bridge).unwrap();
        let download = session
            .panel(Side::Remote)
            .entries()
            .iter()
            .find(|e| e.name == "Download")
            .cloned()
            .unwrap();

        let request = session.navigate(Side::Remote, &download).unwrap().unwrap();
        session.load_blocking(request, &bridge).unwrap();
        assert_eq!(session.remote_path(), "/sdcard/Download");
        assert_eq!(names(session.panel(Side::Remote)), vec!["[ Refresh ]", "..", "a.apk"]);

        let request = session
            .navigate(Side::Remote, &DirEntry::parent())
            .unwrap()
            .unwrap();
        session.load_blocking(request, &bridge).unwrap();
        assert_eq!(session.remote_path(), "/sdcard");
        assert_eq!(names(session.panel(Side::Remote)), vec!["[ Refresh ]", "Download"]);
    }

    #[test]
    fn test_resolved_root_is_recorded_as_alias() {
        let bridge = FakeBridge::new()
            .shell("readlink -f '/sdcard'", "/storage/emulated/0\n")
            .shell("readlink -f '/storage/emulated/0'", "/storage/emulated/0\n")
            .shell("ls -la '/storage/emulated/0'", SDCARD_LS);
        let mut session = ready_session(false);

        let request = session.reload(Side::Remote).unwrap();
        session.load_blocking(request, &bridge).unwrap();

        assert_eq!(session.remote_path(), "/storage/emulated/0");
        assert!(session.aliases.is_alias("/storage/emulated/0"));
        assert!(!names(session.panel(Side::Remote)).contains(&".."));

        // the recorded alias is still the root on a plain refresh
        let request = session.reload(Side::Remote).unwrap();
        session.load_blocking(request, &bridge).unwrap();
        assert!(!names(session.panel(Side::Remote)).contains(&".."));
    }

    #[test]
    fn test_browse_above_root_offers_parent() {
        let bridge = FakeBridge::new()
            .shell("readlink -f '/sdcard'", "/storage/emulated/0\n")
            .shell("readlink -f '/storage/emulated/0'", "/storage/emulated/0\n")
            .shell("ls -la '/storage/emulated/0'", SDCARD_LS)
            .shell("readlink -f '/storage/emulated'", "/storage/emulated\n")
            .shell("ls -la '/storage/emulated'", "total 0\n");
        let mut session = ready_session(true);

        let request = session.reload(Side::Remote).unwrap();
        session.load_blocking(request, &bridge).unwrap();
        assert!(names(session.panel(Side::Remote)).contains(&".."));

        let request = session
            .navigate(Side::Remote, &DirEntry::parent())
            .unwrap()
            .unwrap();
        session.load_blocking(request, &bridge).unwrap();
        assert_eq!(session.remote_path(), "/storage/emulated");
    }

    #[test]
    fn test_remote_failure_keeps_last_resolved_path() {
        let bridge = identity_bridge().shell_err("readlink -f '/sdcard/Gone'", "No such file");
        let mut session = ready_session(false);
        let request = session.reload(Side::Remote).unwrap();
        session.load_blocking(request, &bridge).unwrap();

        let request = session
            .navigate(Side::Remote, &DirEntry::new("Gone", true))
            .unwrap()
            .unwrap();
        let err = session.load_blocking(request, &bridge).unwrap_err();
        assert!(matches!(err, SessionError::PathResolution { .. }));
        assert_eq!(session.remote_path(), "/sdcard");
        assert!(matches!(
            session.panel(Side::Remote).state(),
            LoadState::Error(_)
        ));
    }

    #[test]
    fn test_remote_requires_ready_device() {
        let mut session = DeviceSession::new(options(PathBuf::from("/"), false));
        assert!(matches!(
            session.reload(Side::Remote),
            Err(SessionError::DeviceNotReady(DeviceStatus::NoDevice))
        ));
        session.set_device_status(DeviceStatus::UnauthorizedOnly);
        assert!(matches!(
            session.reload(Side::Remote),
            Err(SessionError::DeviceNotReady(DeviceStatus::UnauthorizedOnly))
        ));
    }

    #[test]
    fn test_second_reload_while_loading_is_busy() {
        let mut session = ready_session(false);
        let _pending = session.reload(Side::Local).unwrap();
        assert!(session.panel(Side::Local).is_loading());
        assert!(matches!(
            session.reload(Side::Local),
            Err(SessionError::Busy(Side::Local))
        ));
        // the other side is independent
        assert!(session.reload(Side::Remote).is_ok());
    }

    #[test]
    fn test_reload_queued_while_busy_runs_after_landing() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = FakeBridge::new();
        let mut session = DeviceSession::new(options(dir.path().to_path_buf(), false));

        let in_flight = session.reload(Side::Local).unwrap();
        assert!(session.reload_or_queue(Side::Local).unwrap().is_none());
        assert!(session.panel(Side::Local).reload_pending());
        // nothing to hand out while the first listing is still loading
        assert!(session.take_queued_reload(Side::Local).is_none());

        assert!(matches!(
            session.apply(in_flight.execute(&bridge)),
            Applied::Loaded(Side::Local)
        ));
        let queued = session.take_queued_reload(Side::Local).unwrap().unwrap();
        assert_eq!(queued.side(), Side::Local);
        assert!(session.panel(Side::Local).is_loading());
        assert!(!session.panel(Side::Local).reload_pending());
        assert!(session.take_queued_reload(Side::Local).is_none());
    }

    #[test]
    fn test_stale_outcome_is_dropped() {
        let bridge = FakeBridge::new();
        let mut session = ready_session(false);
        let first = session.reload(Side::Local).unwrap();
        let outcome = first.execute(&bridge);
        let ReloadOutcome::Local { request, .. } = &outcome else {
            panic!("expected a local outcome");
        };
        assert_eq!(request.generation, 1);
        // pretend a newer reload was issued
        session.local.generation += 1;
        assert!(matches!(session.apply(outcome), Applied::Stale));
    }

    #[test]
    fn test_local_failure_retries_start_path_once() {
        let start = tempfile::tempdir().unwrap();
        fs::write(start.path().join("file.txt"), b"x").unwrap();
        let bridge = FakeBridge::new();
        let mut session = DeviceSession::new(options(start.path().to_path_buf(), false));

        let request = session
            .navigate(Side::Local, &DirEntry::new("missing-dir", true))
            .unwrap()
            .unwrap();
        let applied = session.apply(request.execute(&bridge));
        let retry = match applied {
            Applied::Failed {
                retry: Some(retry), ..
            } => retry,
            other => panic!("expected a retry, got {other:?}"),
        };

        assert!(matches!(session.apply(retry.execute(&bridge)), Applied::Loaded(Side::Local)));
        assert_eq!(session.local_path(), start.path());
        assert!(names(session.panel(Side::Local)).contains(&"file.txt"));
    }

    #[test]
    fn test_invalid_start_path_does_not_loop() {
        let bridge = FakeBridge::new();
        let mut session =
            DeviceSession::new(options(PathBuf::from("/no/such/start/dir"), false));
        let request = session.reload(Side::Local).unwrap();
        let err = session.load_blocking(request, &bridge).unwrap_err();
        assert!(matches!(err, SessionError::LocalListing { .. }));
        assert!(!session.panel(Side::Local).is_loading());
    }

    #[test]
    fn test_selection_skips_special_rows_and_clears_on_reload() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let bridge = FakeBridge::new();
        let mut session = DeviceSession::new(options(dir.path().to_path_buf(), false));
        let request = session.reload(Side::Local).unwrap();
        session.load_blocking(request, &bridge).unwrap();

        let panel = session.panel_mut(Side::Local);
        assert!(!panel.toggle_current()); // refresh row
        panel.move_down();
        assert!(!panel.toggle_current()); // ..
        panel.move_down();
        assert!(panel.toggle_current()); // a.txt
        panel.move_down();
        assert!(panel.toggle_current()); // b.txt
        let selected: Vec<String> = panel.selected().into_iter().map(|e| e.name).collect();
        assert_eq!(selected, vec!["a.txt", "b.txt"]);

        let request = session.reload(Side::Local).unwrap();
        session.load_blocking(request, &bridge).unwrap();
        assert!(!session.panel(Side::Local).has_selection());
    }

    #[test]
    fn test_open_remote_lands_on_resolved_path() {
        let bridge = identity_bridge();
        let mut session = ready_session(false);
        let request = session.open_remote("/sdcard/Download").unwrap();
        session.load_blocking(request, &bridge).unwrap();
        assert_eq!(session.remote_path(), "/sdcard/Download");
        assert!(names(session.panel(Side::Remote)).contains(&"a.apk"));
    }
}
