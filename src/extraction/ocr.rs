//! Bounded OCR worker pool.
//!
//! Recognition is the slow stage of the pipeline, so region requests are
//! fanned out over a fixed set of worker threads sharing one engine. The
//! pool owns its threads: dropping it closes the job channel and joins
//! every worker before returning.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use image::GrayImage;
use tracing::{debug, warn};

use super::types::{OcrEngine, OcrOutput, SegmentationMode};
use super::ExtractionError;

struct OcrJob {
    image: GrayImage,
    language: String,
    mode: SegmentationMode,
    reply: mpsc::Sender<Result<OcrOutput, ExtractionError>>,
}

pub struct OcrWorkerPool {
    sender: Option<mpsc::Sender<OcrJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl OcrWorkerPool {
    /// Spawn `worker_count` recognition threads (at least one) sharing the
    /// engine.
    pub fn new(engine: Arc<dyn OcrEngine>, worker_count: usize) -> Result<Self, ExtractionError> {
        let (sender, receiver) = mpsc::channel::<OcrJob>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::new();
        for worker in 0..worker_count.max(1) {
            let receiver = Arc::clone(&receiver);
            let engine = Arc::clone(&engine);
            let handle = thread::Builder::new()
                .name(format!("ocr-worker-{worker}"))
                .spawn(move || run_worker(&receiver, engine.as_ref()))?;
            workers.push(handle);
        }

        debug!(workers = workers.len(), "OCR worker pool started");
        Ok(Self { sender: Some(sender), workers })
    }

    /// Recognize one region image. Blocks until a worker picks up the job
    /// and replies.
    pub fn recognize(
        &self,
        image: &GrayImage,
        language: &str,
        mode: SegmentationMode,
    ) -> Result<OcrOutput, ExtractionError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| ExtractionError::OcrUnavailable("worker pool shut down".into()))?;

        let (reply_tx, reply_rx) = mpsc::channel();
        sender
            .send(OcrJob {
                image: image.clone(),
                language: language.to_string(),
                mode,
                reply: reply_tx,
            })
            .map_err(|_| ExtractionError::OcrUnavailable("OCR workers stopped".into()))?;

        reply_rx
            .recv()
            .map_err(|_| ExtractionError::OcrUnavailable("OCR worker dropped request".into()))?
    }
}

impl Drop for OcrWorkerPool {
    fn drop(&mut self) {
        // Closing the channel ends every worker's recv loop.
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("OCR worker panicked during shutdown");
            }
        }
    }
}

fn run_worker(receiver: &Mutex<mpsc::Receiver<OcrJob>>, engine: &dyn OcrEngine) {
    loop {
        // Hold the lock only while receiving so workers process in parallel.
        let job = match receiver.lock() {
            Ok(guard) => guard.recv(),
            Err(_) => break,
        };
        match job {
            Ok(job) => {
                let result = engine.recognize(&job.image, &job.language, job.mode);
                // A dropped reply receiver means the caller gave up; fine.
                let _ = job.reply.send(result);
            }
            Err(_) => break,
        }
    }
}
