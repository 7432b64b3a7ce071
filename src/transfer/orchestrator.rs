use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::plan::{build_plan, CopyDirection, PlanEntry, Probe};
use super::progress::{ProgressSnapshot, ProgressTracker};
use crate::bridge::CommandRunner;
use crate::config::TransferConfig;
use crate::session::DirEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferPhase {
    #[default]
    Idle,
    Planning,
    Transferring,
    Completed,
}

#[derive(Debug, Clone)]
pub enum TransferEvent {
    Skipped { name: String, reason: String },
    Planned { files: usize, total_bytes: u64 },
    Copying { name: String },
    Copied { name: String },
    Failed { name: String, message: String },
    Progress(ProgressSnapshot),
    Finished(TransferSummary),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferSummary {
    pub copied: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

/// Everything a batch needs from the session, captured when it starts.
#[derive(Debug, Clone)]
pub struct TransferJob {
    pub direction: CopyDirection,
    pub selected: Vec<DirEntry>,
    pub local_dir: PathBuf,
    pub remote_dir: String,
}

/// Stops a batch before its next file. The file in flight still finishes.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs one copy batch: plan, then transfer file by file while a poller
/// samples the destinations for progress.
pub struct TransferOrchestrator {
    runner: Arc<dyn CommandRunner>,
    config: TransferConfig,
}

impl TransferOrchestrator {
    pub fn new(runner: Arc<dyn CommandRunner>, config: TransferConfig) -> Self {
        Self { runner, config }
    }

    pub async fn run(
        &self,
        job: TransferJob,
        events: UnboundedSender<TransferEvent>,
        cancel: CancelHandle,
    ) -> TransferSummary {
        let direction = job.direction;
        let mut summary = TransferSummary::default();

        let runner = Arc::clone(&self.runner);
        let plan = match tokio::task::spawn_blocking(move || {
            build_plan(
                runner.as_ref(),
                job.direction,
                &job.selected,
                &job.local_dir,
                &job.remote_dir,
            )
        })
        .await
        {
            Ok(plan) => plan,
            Err(e) => {
                error!("Planning task failed: {}", e);
                let _ = events.send(TransferEvent::Finished(summary.clone()));
                return summary;
            }
        };

        summary.skipped = plan.skipped.len();
        for skipped in &plan.skipped {
            let _ = events.send(TransferEvent::Skipped {
                name: skipped.name.clone(),
                reason: skipped.reason.to_string(),
            });
        }
        let _ = events.send(TransferEvent::Planned {
            files: plan.entries.len(),
            total_bytes: plan.total_bytes,
        });

        if plan.is_empty() {
            let _ = events.send(TransferEvent::Finished(summary.clone()));
            return summary;
        }

        let entries = Arc::new(plan.entries);
        let poller = self.spawn_poller(Arc::clone(&entries), direction, plan.total_bytes, events.clone());

        for entry in entries.iter() {
            if cancel.is_cancelled() {
                info!("Transfer cancelled before {}", entry.name);
                summary.cancelled = true;
                break;
            }

            debug!("{} {} ({} bytes)", direction.verb(), entry.name, entry.size);
            let _ = events.send(TransferEvent::Copying {
                name: entry.name.clone(),
            });

            let runner = Arc::clone(&self.runner);
            let args = entry.bridge_args(direction);
            let result = tokio::task::spawn_blocking(move || runner.run(&args)).await;

            match result {
                Ok(Ok(output)) => {
                    debug!("{}", output.trim());
                    summary.copied += 1;
                    let _ = events.send(TransferEvent::Copied {
                        name: entry.name.clone(),
                    });
                }
                Ok(Err(e)) => {
                    error!("Copy of {} failed: {}", entry.name, e);
                    summary.failed += 1;
                    let _ = events.send(TransferEvent::Failed {
                        name: entry.name.clone(),
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    error!("Copy task for {} failed: {}", entry.name, e);
                    summary.failed += 1;
                    let _ = events.send(TransferEvent::Failed {
                        name: entry.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        poller.abort();
        // wait out the abort so no snapshot can trail the summary
        let _ = poller.await;
        info!(
            "Transfer finished: {} copied, {} failed, {} skipped",
            summary.copied, summary.failed, summary.skipped
        );
        let _ = events.send(TransferEvent::Finished(summary.clone()));
        summary
    }

    fn spawn_poller(
        &self,
        entries: Arc<Vec<PlanEntry>>,
        direction: CopyDirection,
        total_bytes: u64,
        events: UnboundedSender<TransferEvent>,
    ) -> JoinHandle<()> {
        let runner = Arc::clone(&self.runner);
        let initial_delay = self.config.initial_delay();
        let period = self.config.interval();
        let mut tracker = ProgressTracker::new(total_bytes, self.config.speed_policy, Instant::now());

        tokio::spawn(async move {
            tokio::time::sleep(initial_delay).await;
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;

                let runner = Arc::clone(&runner);
                let entries = Arc::clone(&entries);
                let copied = tokio::task::spawn_blocking(move || {
                    Probe::new(runner.as_ref()).copied_bytes(&entries, direction)
                })
                .await
                .unwrap_or(0);

                let snapshot = tracker.sample(copied, Instant::now());
                if events.send(TransferEvent::Progress(snapshot)).is_err() {
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::fake::FakeBridge;
    use crate::bridge::BridgeOutput;
    use crate::error::BridgeError;
    use crate::transfer::progress::ByteUnit;
    use std::fs;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn quick_config() -> TransferConfig {
        TransferConfig {
            poll_initial_delay_ms: 0,
            poll_interval_ms: 5,
            ..TransferConfig::default()
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TransferEvent>) -> Vec<TransferEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_batch_skips_existing_and_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        for (name, len) in [("one.bin", 1000), ("two.bin", 2000), ("three.bin", 10)] {
            fs::write(dir.path().join(name), vec![0u8; len]).unwrap();
        }
        let local = |name: &str| dir.path().join(name).to_string_lossy().to_string();

        let bridge = FakeBridge::new()
            .shell("test -e '/sdcard/one.bin' && echo 1 || echo 0", "1\n")
            .shell("test -e '/sdcard/two.bin' && echo 1 || echo 0", "0\n")
            .shell("test -e '/sdcard/three.bin' && echo 1 || echo 0", "0\n")
            .fail(&["push", local("two.bin").as_str(), "/sdcard/two.bin"], "remote write failed")
            .reply(&["push", local("three.bin").as_str(), "/sdcard/three.bin"], "1 file pushed")
            .shell("du -sb '/sdcard/two.bin' | cut -f1", "0")
            .shell("du -sb '/sdcard/three.bin' | cut -f1", "10");

        let orchestrator = TransferOrchestrator::new(Arc::new(bridge), quick_config());
        let job = TransferJob {
            direction: CopyDirection::Push,
            selected: vec![
                DirEntry::new("one.bin", false),
                DirEntry::new("two.bin", false),
                DirEntry::new("three.bin", false),
            ],
            local_dir: dir.path().to_path_buf(),
            remote_dir: "/sdcard".to_string(),
        };
        let (tx, mut rx) = mpsc::unbounded_channel();

        let summary = orchestrator.run(job, tx, CancelHandle::default()).await;
        assert_eq!(
            summary,
            TransferSummary {
                copied: 1,
                failed: 1,
                skipped: 1,
                cancelled: false
            }
        );

        let events: Vec<TransferEvent> = drain(&mut rx)
            .into_iter()
            .filter(|e| !matches!(e, TransferEvent::Progress(_)))
            .collect();
        assert!(matches!(&events[0], TransferEvent::Skipped { name, .. } if name == "one.bin"));
        assert!(matches!(
            events[1],
            TransferEvent::Planned {
                files: 2,
                total_bytes: 2010
            }
        ));
        assert!(matches!(&events[2], TransferEvent::Copying { name } if name == "two.bin"));
        assert!(matches!(&events[3], TransferEvent::Failed { name, .. } if name == "two.bin"));
        assert!(matches!(&events[4], TransferEvent::Copying { name } if name == "three.bin"));
        assert!(matches!(&events[5], TransferEvent::Copied { name } if name == "three.bin"));
        assert!(matches!(events[6], TransferEvent::Finished(_)));
        assert_eq!(events.len(), 7);
    }

    /// Holds every copy for a while so the poller gets to sample.
    struct SlowCopies {
        inner: FakeBridge,
        delay: Duration,
    }

    impl CommandRunner for SlowCopies {
        fn execute(&self, args: &[String]) -> Result<BridgeOutput, BridgeError> {
            if args.first().map(String::as_str) == Some("push") {
                std::thread::sleep(self.delay);
            }
            self.inner.execute(args)
        }
    }

    #[tokio::test]
    async fn test_poller_reports_destination_sizes_until_finished() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.bin"), vec![0u8; 1000]).unwrap();
        fs::write(dir.path().join("b.bin"), vec![0u8; 3000]).unwrap();
        let local = |name: &str| dir.path().join(name).to_string_lossy().to_string();

        let inner = FakeBridge::new()
            .shell("test -e '/sdcard/a.bin' && echo 1 || echo 0", "0\n")
            .shell("test -e '/sdcard/b.bin' && echo 1 || echo 0", "0\n")
            .reply(&["push", local("a.bin").as_str(), "/sdcard/a.bin"], "1 file pushed")
            .reply(&["push", local("b.bin").as_str(), "/sdcard/b.bin"], "1 file pushed")
            .shell("du -sb '/sdcard/a.bin' | cut -f1", "1000\n")
            .shell("du -sb '/sdcard/b.bin' | cut -f1", "512\n");
        let runner = SlowCopies {
            inner,
            delay: Duration::from_millis(60),
        };
        let orchestrator = TransferOrchestrator::new(Arc::new(runner), quick_config());
        let job = TransferJob {
            direction: CopyDirection::Push,
            selected: vec![DirEntry::new("a.bin", false), DirEntry::new("b.bin", false)],
            local_dir: dir.path().to_path_buf(),
            remote_dir: "/sdcard".to_string(),
        };
        let (tx, mut rx) = mpsc::unbounded_channel();

        let summary = orchestrator.run(job, tx, CancelHandle::default()).await;
        assert_eq!(summary.copied, 2);

        let events = drain(&mut rx);
        let snapshots: Vec<&ProgressSnapshot> = events
            .iter()
            .filter_map(|e| match e {
                TransferEvent::Progress(snapshot) => Some(snapshot),
                _ => None,
            })
            .collect();
        assert!(!snapshots.is_empty());
        for snapshot in snapshots {
            assert_eq!(snapshot.total_bytes, 4000);
            assert_eq!(snapshot.copied_bytes, 1512);
            assert_eq!(snapshot.unit, ByteUnit::KB);
        }
        assert!(matches!(events.last(), Some(TransferEvent::Finished(_))));

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_empty_plan_finishes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = TransferOrchestrator::new(Arc::new(FakeBridge::new()), quick_config());
        let job = TransferJob {
            direction: CopyDirection::Pull,
            selected: vec![DirEntry::refresh()],
            local_dir: dir.path().to_path_buf(),
            remote_dir: "/sdcard".to_string(),
        };
        let (tx, mut rx) = mpsc::unbounded_channel();

        let summary = orchestrator.run(job, tx, CancelHandle::default()).await;
        assert_eq!(summary, TransferSummary::default());
        let events = drain(&mut rx);
        assert!(matches!(events.last(), Some(TransferEvent::Finished(_))));
    }

    #[tokio::test]
    async fn test_cancelled_batch_copies_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = FakeBridge::new().shell("du -sb '/sdcard/pic.jpg' | cut -f1", "77");
        let orchestrator = TransferOrchestrator::new(Arc::new(bridge), quick_config());
        let job = TransferJob {
            direction: CopyDirection::Pull,
            selected: vec![DirEntry::new("pic.jpg", false)],
            local_dir: dir.path().to_path_buf(),
            remote_dir: "/sdcard".to_string(),
        };
        let cancel = CancelHandle::default();
        cancel.cancel();
        let (tx, _rx) = mpsc::unbounded_channel();

        let summary = orchestrator.run(job, tx, cancel).await;
        assert!(summary.cancelled);
        assert_eq!(summary.copied, 0);
    }
}
