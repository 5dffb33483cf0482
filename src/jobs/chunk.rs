//! Chunked page processing with bounded concurrency and retries.
//!
//! Page ranges are split into fixed-size chunks processed in waves of
//! scoped threads. Each chunk retries with exponential backoff; when the
//! attempts are exhausted the last error is surfaced. A progress callback
//! reports the completed percentage with a page-range label.

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::JobError;
use crate::config::JobConfig;

/// Split a 1-based page range into inclusive chunks.
pub fn chunk_pages(total_pages: usize, chunk_size: usize) -> Vec<(usize, usize)> {
    let size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 1;
    while start <= total_pages {
        let end = (start + size - 1).min(total_pages);
        chunks.push((start, end));
        start = end + 1;
    }
    chunks
}

/// Process chunks in waves of `max_concurrent_jobs` scoped threads,
/// preserving chunk order in the output. The first chunk whose retries
/// are exhausted aborts the remaining waves.
pub fn process_chunks<T, W, P>(
    chunks: &[(usize, usize)],
    config: &JobConfig,
    worker: W,
    mut progress: P,
) -> Result<Vec<T>, JobError>
where
    T: Send,
    W: Fn(usize, usize) -> Result<T, String> + Sync,
    P: FnMut(f32, &str),
{
    let concurrency = config.max_concurrent_jobs.max(1);
    let mut results = Vec::with_capacity(chunks.len());
    let mut done = 0usize;

    for wave in chunks.chunks(concurrency) {
        let wave_results: Vec<Result<T, JobError>> = thread::scope(|scope| {
            let handles: Vec<_> = wave
                .iter()
                .map(|&(start, end)| {
                    let worker = &worker;
                    scope.spawn(move || {
                        run_with_retry(
                            || worker(start, end),
                            config.max_retries,
                            config.backoff_base_ms,
                        )
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(_) => Err(JobError::RetriesExhausted {
                        attempts: config.max_retries,
                        last_error: "chunk worker panicked".to_string(),
                    }),
                })
                .collect()
        });

        for (&(start, end), result) in wave.iter().zip(wave_results) {
            let value = result?;
            results.push(value);
            done += 1;
            let percent = done as f32 / chunks.len() as f32 * 100.0;
            progress(percent, &format!("pages {start}-{end}"));
            debug!(start, end, percent, "Chunk complete");
        }
    }

    Ok(results)
}

/// Retry an operation with doubling backoff, keeping the last error.
fn run_with_retry<T>(
    op: impl Fn() -> Result<T, String>,
    max_retries: u32,
    base_ms: u64,
) -> Result<T, JobError> {
    let attempts = max_retries.max(1);
    let mut last_error = String::new();
    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = base_ms.saturating_mul(1u64 << (attempt - 1).min(16));
            thread::sleep(Duration::from_millis(delay));
        }
        match op() {
            Ok(value) => return Ok(value),
            Err(error) => {
                warn!(attempt = attempt + 1, %error, "Chunk attempt failed");
                last_error = error;
            }
        }
    }
    Err(JobError::RetriesExhausted { attempts, last_error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> JobConfig {
        JobConfig {
            max_concurrent_jobs: 2,
            max_retries: 3,
            backoff_base_ms: 1,
            ..JobConfig::default()
        }
    }

    #[test]
    fn pages_split_into_inclusive_chunks() {
        assert_eq!(chunk_pages(20, 8), vec![(1, 8), (9, 16), (17, 20)]);
        assert_eq!(chunk_pages(5, 8), vec![(1, 5)]);
        assert_eq!(chunk_pages(8, 8), vec![(1, 8)]);
        assert!(chunk_pages(0, 8).is_empty());
    }

    #[test]
    fn zero_chunk_size_behaves_as_one() {
        assert_eq!(chunk_pages(3, 0), vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn results_keep_chunk_order() {
        let chunks = chunk_pages(20, 8);
        let results = process_chunks(
            &chunks,
            &fast_config(),
            |start, _end| Ok::<usize, String>(start),
            |_, _| {},
        )
        .unwrap();
        assert_eq!(results, vec![1, 9, 17]);
    }

    #[test]
    fn transient_failure_is_retried() {
        let failures = AtomicU32::new(0);
        let chunks = chunk_pages(8, 8);
        let results = process_chunks(
            &chunks,
            &fast_config(),
            |start, _end| {
                if failures.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("transient read error".to_string())
                } else {
                    Ok(start)
                }
            },
            |_, _| {},
        )
        .unwrap();
        assert_eq!(results, vec![1]);
        assert_eq!(failures.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn exhausted_retries_surface_the_last_error() {
        let chunks = chunk_pages(8, 8);
        let result = process_chunks(
            &chunks,
            &fast_config(),
            |_, _| Err::<(), String>("rasterizer unavailable".to_string()),
            |_, _| {},
        );
        match result {
            Err(JobError::RetriesExhausted { attempts, last_error }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "rasterizer unavailable");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn panicking_worker_becomes_an_error() {
        let chunks = chunk_pages(8, 8);
        let result = process_chunks(
            &chunks,
            &fast_config(),
            |_, _| -> Result<(), String> { panic!("boom") },
            |_, _| {},
        );
        assert!(matches!(result, Err(JobError::RetriesExhausted { .. })));
    }

    #[test]
    fn progress_reaches_one_hundred_with_labels() {
        let chunks = chunk_pages(20, 8);
        let mut reported: Vec<(f32, String)> = Vec::new();
        process_chunks(
            &chunks,
            &fast_config(),
            |start, _end| Ok::<usize, String>(start),
            |percent, label| reported.push((percent, label.to_string())),
        )
        .unwrap();

        assert_eq!(reported.len(), 3);
        assert!(reported.windows(2).all(|w| w[0].0 < w[1].0));
        assert!((reported.last().unwrap().0 - 100.0).abs() < 1e-3);
        assert!(reported.iter().any(|(_, l)| l == "pages 1-8"));
        assert!(reported.iter().any(|(_, l)| l == "pages 17-20"));
    }
}
