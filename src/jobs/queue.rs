//! Concurrency gate for heavy operations.
//!
//! A bounded active set with polling acquisition. Waiting is bounded: a
//! caller that exhausts its polls proceeds best-effort with a warning
//! rather than deadlocking. Cancellation is advisory and checked at
//! stage boundaries, in-flight work runs to completion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use super::{JobError, JobStatus, ProcessingJob};

const POLL_BASE_MS: u64 = 10;
const MAX_POLLS: u32 = 8;

struct State {
    active: usize,
    jobs: HashMap<Uuid, ProcessingJob>,
}

pub struct JobQueue {
    state: Arc<Mutex<State>>,
    max_active: usize,
    poll_base: Duration,
    max_polls: u32,
}

/// Holds one slot of the active set, released on drop.
pub struct SlotGuard {
    state: Arc<Mutex<State>>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().expect("queue lock poisoned");
        state.active = state.active.saturating_sub(1);
    }
}

impl JobQueue {
    pub fn new(max_concurrent: usize) -> Self {
        Self::with_polling(max_concurrent, POLL_BASE_MS, MAX_POLLS)
    }

    /// Queue with custom polling cadence. The wait before giving up is
    /// the sum of `base_ms` doubling once per poll.
    pub fn with_polling(max_concurrent: usize, base_ms: u64, max_polls: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(State { active: 0, jobs: HashMap::new() })),
            max_active: max_concurrent.max(1),
            poll_base: Duration::from_millis(base_ms),
            max_polls,
        }
    }

    /// Register a job. It stays pending until a slot is acquired for it.
    pub fn submit(&self, job_type: &str, priority: u8) -> Uuid {
        let job = ProcessingJob {
            id: Uuid::new_v4(),
            job_type: job_type.to_string(),
            status: JobStatus::Pending,
            priority,
            progress: 0.0,
        };
        let id = job.id;
        let mut state = self.state.lock().expect("queue lock poisoned");
        state.jobs.insert(id, job);
        debug!(job = %id, job_type, "Job submitted");
        id
    }

    /// Wait for a slot in the active set. Cancelled jobs are refused.
    /// After the bounded wait the slot is taken anyway with a warning.
    pub fn acquire(&self, id: Uuid) -> Result<SlotGuard, JobError> {
        let mut attempt: u32 = 0;
        loop {
            {
                let mut state = self.state.lock().expect("queue lock poisoned");
                let job = state.jobs.get(&id).ok_or(JobError::QueueClosed)?;
                if job.status == JobStatus::Cancelled {
                    return Err(JobError::Cancelled);
                }
                if state.active < self.max_active || attempt >= self.max_polls {
                    if state.active >= self.max_active {
                        warn!(job = %id, "Active set full after bounded wait, proceeding");
                    }
                    state.active += 1;
                    if let Some(job) = state.jobs.get_mut(&id) {
                        job.status = JobStatus::Processing;
                    }
                    return Ok(SlotGuard { state: Arc::clone(&self.state) });
                }
            }
            thread::sleep(self.poll_base * 2u32.saturating_pow(attempt));
            attempt += 1;
        }
    }

    /// Advisory cancellation, honored at the next stage boundary.
    pub fn cancel(&self, id: Uuid) {
        let mut state = self.state.lock().expect("queue lock poisoned");
        if let Some(job) = state.jobs.get_mut(&id) {
            job.status = JobStatus::Cancelled;
            debug!(job = %id, "Job cancelled");
        }
    }

    pub fn is_cancelled(&self, id: Uuid) -> bool {
        self.status(id) == Some(JobStatus::Cancelled)
    }

    pub fn set_progress(&self, id: Uuid, progress: f32) {
        let mut state = self.state.lock().expect("queue lock poisoned");
        if let Some(job) = state.jobs.get_mut(&id) {
            job.progress = progress.clamp(0.0, 100.0);
        }
    }

    /// Mark completion. A cancelled job stays cancelled.
    pub fn complete(&self, id: Uuid) {
        self.finish(id, JobStatus::Completed, 100.0);
    }

    pub fn fail(&self, id: Uuid) {
        self.finish(id, JobStatus::Failed, 0.0);
    }

    fn finish(&self, id: Uuid, status: JobStatus, progress: f32) {
        let mut state = self.state.lock().expect("queue lock poisoned");
        if let Some(job) = state.jobs.get_mut(&id) {
            if job.status != JobStatus::Cancelled {
                job.status = status;
                job.progress = progress;
            }
        }
    }

    pub fn status(&self, id: Uuid) -> Option<JobStatus> {
        let state = self.state.lock().expect("queue lock poisoned");
        state.jobs.get(&id).map(|j| j.status)
    }

    pub fn job(&self, id: Uuid) -> Option<ProcessingJob> {
        let state = self.state.lock().expect("queue lock poisoned");
        state.jobs.get(&id).cloned()
    }
}
