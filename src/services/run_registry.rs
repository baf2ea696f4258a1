use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use crate::domain::{listing::Listing, search::SearchParameters};

use super::{CancelFlag, RunEvent};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub run_id: Uuid,
    pub params: SearchParameters,
    pub status: RunStatus,
    pub percent: u8,
    pub message: String,
    pub record_count: usize,
    pub listings: Vec<Listing>,
    pub files: Vec<PathBuf>,
    pub failure: Option<String>,
    pub cancel_requested: bool,
    pub submitted_at: DateTime<Local>,
}

const DEFAULT_RETAINED_RUNS: usize = 20;

struct RunEntry {
    snapshot: RunSnapshot,
    cancel: CancelFlag,
    sequence: u64,
}

/// Front-end view of every run, fed only by [`RunEvent`]s. Queued and running
/// runs are always kept; only the newest `retained_runs` finished ones are.
pub struct RunRegistry {
    runs: RwLock<HashMap<Uuid, RunEntry>>,
    retained_runs: usize,
    next_sequence: AtomicU64,
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETAINED_RUNS)
    }
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retained_runs: usize) -> Self {
        RunRegistry {
            runs: RwLock::new(HashMap::new()),
            retained_runs,
            next_sequence: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, RunEntry>> {
        self.runs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, RunEntry>> {
        self.runs.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Records a queued run and hands back the flag its worker will poll.
    pub fn register(&self, params: SearchParameters) -> (Uuid, CancelFlag) {
        let run_id = Uuid::new_v4();
        let cancel = CancelFlag::new();
        let snapshot = RunSnapshot {
            run_id,
            params,
            status: RunStatus::Queued,
            percent: 0,
            message: "Queued".to_string(),
            record_count: 0,
            listings: vec![],
            files: vec![],
            failure: None,
            cancel_requested: false,
            submitted_at: Local::now(),
        };

        self.write().insert(
            run_id,
            RunEntry {
                snapshot,
                cancel: cancel.clone(),
                sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
            },
        );
        (run_id, cancel)
    }

    /// Drops a run whose request never reached the worker.
    pub fn forget(&self, run_id: &Uuid) {
        self.write().remove(run_id);
    }

    pub fn snapshot(&self, run_id: &Uuid) -> Option<RunSnapshot> {
        self.read().get(run_id).map(|entry| entry.snapshot.clone())
    }

    /// Newest first.
    pub fn snapshots(&self) -> Vec<RunSnapshot> {
        let mut snapshots: Vec<RunSnapshot> = self
            .read()
            .values()
            .map(|entry| entry.snapshot.clone())
            .collect();
        snapshots.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        snapshots
    }

    /// Returns false for unknown runs.
    pub fn cancel(&self, run_id: &Uuid) -> bool {
        match self.write().get_mut(run_id) {
            Some(entry) => {
                entry.cancel.request();
                entry.snapshot.cancel_requested = true;
                if !entry.snapshot.status.is_finished() {
                    entry.snapshot.message = "Cancelling".to_string();
                }
                true
            }
            None => false,
        }
    }

    pub fn apply(&self, event: RunEvent) {
        let mut runs = self.write();
        let run_id = match &event {
            RunEvent::Started { run_id }
            | RunEvent::Progress { run_id, .. }
            | RunEvent::Completed { run_id, .. }
            | RunEvent::Failed { run_id, .. } => *run_id,
        };
        let Some(entry) = runs.get_mut(&run_id) else {
            log::warn!("Event for unknown run {}", run_id);
            return;
        };
        let snapshot = &mut entry.snapshot;

        match event {
            RunEvent::Started { .. } => {
                snapshot.status = RunStatus::Running;
                snapshot.message = "Started".to_string();
            }
            RunEvent::Progress {
                percent, message, ..
            } => {
                snapshot.percent = percent;
                snapshot.message = message;
            }
            RunEvent::Completed {
                listings, files, ..
            } => {
                snapshot.status = RunStatus::Completed;
                snapshot.percent = 100;
                snapshot.message = match snapshot.cancel_requested {
                    true => format!("Cancelled with {} listings", listings.len()),
                    false => format!("Completed with {} listings", listings.len()),
                };
                snapshot.record_count = listings.len();
                snapshot.listings = listings;
                snapshot.files = files;
            }
            RunEvent::Failed {
                reason,
                listings,
                files,
                ..
            } => {
                snapshot.status = RunStatus::Failed;
                snapshot.message = format!("Failed with {} listings", listings.len());
                snapshot.record_count = listings.len();
                snapshot.listings = listings;
                snapshot.files = files;
                snapshot.failure = Some(reason);
            }
        }

        if entry.snapshot.status.is_finished() {
            evict_finished(&mut runs, self.retained_runs);
        }
    }
}

/// Drops the oldest finished runs beyond `keep`.
fn evict_finished(runs: &mut HashMap<Uuid, RunEntry>, keep: usize) {
    let mut finished: Vec<(u64, Uuid)> = runs
        .values()
        .filter(|entry| entry.snapshot.status.is_finished())
        .map(|entry| (entry.sequence, entry.snapshot.run_id))
        .collect();
    if finished.len() <= keep {
        return;
    }

    finished.sort_unstable();
    for (_, run_id) in finished.iter().take(finished.len() - keep) {
        log::debug!("Forgetting finished run {}", run_id);
        runs.remove(run_id);
    }
}

pub async fn run_event_handler(
    mut event_receiver: UnboundedReceiver<RunEvent>,
    registry: Arc<RunRegistry>,
) {
    log::info!("Started run event handler");

    while let Some(event) = event_receiver.recv().await {
        if let RunEvent::Failed { run_id, reason, .. } = &event {
            log::error!("Run {} failed: {}", run_id, reason);
        }
        registry.apply(event);
    }

    log::info!("Run event channel closed");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;
    use uuid::Uuid;

    use super::{run_event_handler, RunRegistry, RunStatus};
    use crate::{domain::search::SearchParameters, services::RunEvent};

    fn params() -> SearchParameters {
        SearchParameters::new("rust", "Pune", 2, 10).unwrap()
    }

    #[test]
    fn apply_walks_run_lifecycle() {
        let registry = RunRegistry::new();
        let (run_id, _) = registry.register(params());
        assert_eq!(registry.snapshot(&run_id).unwrap().status, RunStatus::Queued);

        registry.apply(RunEvent::Started { run_id });
        registry.apply(RunEvent::Progress {
            run_id,
            percent: 42,
            message: "Page 2: found 4 listings (total 8/10)".to_string(),
        });
        let running = registry.snapshot(&run_id).unwrap();
        assert_eq!(running.status, RunStatus::Running);
        assert_eq!(running.percent, 42);

        registry.apply(RunEvent::Failed {
            run_id,
            reason: "pagination stalled".to_string(),
            listings: vec![],
            files: vec!["out/jobs.csv".into()],
        });
        let failed = registry.snapshot(&run_id).unwrap();
        assert_eq!(failed.status, RunStatus::Failed);
        assert_eq!(failed.failure.as_deref(), Some("pagination stalled"));
        assert_eq!(failed.files.len(), 1);
    }

    #[test]
    fn cancel_sets_shared_flag() {
        let registry = RunRegistry::new();
        let (run_id, flag) = registry.register(params());

        assert!(registry.cancel(&run_id));
        assert!(flag.is_requested());
        assert!(registry.snapshot(&run_id).unwrap().cancel_requested);
        assert!(!registry.cancel(&Uuid::new_v4()));
    }

    #[test]
    fn apply_ignores_unknown_runs() {
        let registry = RunRegistry::new();
        registry.apply(RunEvent::Started {
            run_id: Uuid::new_v4(),
        });
        assert!(registry.snapshots().is_empty());
    }

    #[test]
    fn finished_runs_beyond_retention_are_forgotten() {
        let registry = RunRegistry::with_retention(2);
        let ids: Vec<Uuid> = (0..3).map(|_| registry.register(params()).0).collect();
        let (running, _) = registry.register(params());
        registry.apply(RunEvent::Started { run_id: running });

        for run_id in ids.iter() {
            registry.apply(RunEvent::Completed {
                run_id: *run_id,
                listings: vec![],
                files: vec![],
            });
        }

        assert!(registry.snapshot(&ids[0]).is_none());
        assert!(registry.snapshot(&ids[1]).is_some());
        assert!(registry.snapshot(&ids[2]).is_some());
        assert_eq!(
            registry.snapshot(&running).unwrap().status,
            RunStatus::Running
        );
        assert_eq!(registry.snapshots().len(), 3);
    }

    #[tokio::test]
    async fn run_event_handler_drains_channel() {
        let registry = Arc::new(RunRegistry::new());
        let (run_id, _) = registry.register(params());
        let (sender, receiver) = mpsc::unbounded_channel();

        sender.send(RunEvent::Started { run_id }).unwrap();
        sender
            .send(RunEvent::Completed {
                run_id,
                listings: vec![],
                files: vec![],
            })
            .unwrap();
        drop(sender);
        run_event_handler(receiver, registry.clone()).await;

        let done = registry.snapshot(&run_id).unwrap();
        assert_eq!(done.status, RunStatus::Completed);
        assert_eq!(done.percent, 100);
    }
}
