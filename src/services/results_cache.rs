use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::PipelineSnapshot;

/// Holds the most recently completed run for the dashboard and api. Runs
/// replace the snapshot wholesale; readers never block and may see the
/// previous run while a new one is being published.
///
/// At most one run is in flight at a time: a run holds a [`RunPermit`] until
/// it has finished.
#[derive(Default)]
pub struct ResultsCache {
    latest: ArcSwapOption<PipelineSnapshot>,
    running: Arc<AtomicBool>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RunSummary {
    pub run_id: Option<Uuid>,
    pub finished_at: Option<DateTime<Utc>>,
    pub job_count: usize,
    pub running: bool,
}

/// Marks a run as in flight until dropped.
pub struct RunPermit {
    running: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

impl ResultsCache {
    pub fn publish(&self, snapshot: PipelineSnapshot) -> Arc<PipelineSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.latest.store(Some(snapshot.clone()));
        snapshot
    }

    pub fn latest(&self) -> Option<Arc<PipelineSnapshot>> {
        self.latest.load_full()
    }

    /// None while another run still holds its permit.
    pub fn try_begin_run(&self) -> Option<RunPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                running: self.running.clone(),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn summary(&self) -> RunSummary {
        match self.latest() {
            Some(snapshot) => RunSummary {
                run_id: Some(snapshot.run_id),
                finished_at: Some(snapshot.finished_at),
                job_count: snapshot.jobs.len(),
                running: self.is_running(),
            },
            None => RunSummary {
                run_id: None,
                finished_at: None,
                job_count: 0,
                running: self.is_running(),
            },
        }
    }
}
