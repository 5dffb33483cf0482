//! Background job bookkeeping: cache, concurrency gate and chunked
//! processing with retries.

pub mod cache;
pub mod chunk;
pub mod queue;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use cache::ExtractionCache;
pub use chunk::{chunk_pages, process_chunks};
pub use queue::JobQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

/// One tracked heavy operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingJob {
    pub id: Uuid,
    pub job_type: String,
    pub status: JobStatus,
    /// Lower is more urgent.
    pub priority: u8,
    /// 0-100.
    pub progress: f32,
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job was cancelled")]
    Cancelled,

    #[error("All {attempts} attempts failed: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Job queue is closed")]
    QueueClosed,
}
