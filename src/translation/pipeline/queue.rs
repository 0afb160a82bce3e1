/*!
 * Background translation queue.
 *
 * Commit events enqueue a document id and return immediately. A small pool
 * of worker tasks runs the orchestrator; every id is routed to the same
 * worker, so runs for one document never overlap while a slow document only
 * holds up the ids that share its worker. While a job for a document is
 * waiting, further requests for it are coalesced. Once a job starts, a new
 * request queues another run so edits made during translation are picked up.
 *
 * Finished jobs leave their result in a bounded history; the oldest entries
 * are dropped when nobody drains it.
 */

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::orchestrator::{DocumentReport, TranslationOrchestrator};
use crate::app_config::Config;
use crate::documents::{CommitListener, DocumentCommitted};
use crate::errors::TranslationError;

/// Outcome of one queued job
pub type JobResult = Result<DocumentReport, TranslationError>;

/// Sizing of the worker pool and the result history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueOptions {
    /// Number of worker tasks
    pub workers: usize,
    /// Results kept for `take_results` before the oldest are dropped
    pub result_capacity: usize,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            result_capacity: 256,
        }
    }
}

impl QueueOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.pipeline.queue_workers,
            ..Self::default()
        }
    }
}

/// Bounded history of finished jobs
struct ResultLog {
    entries: VecDeque<JobResult>,
    capacity: usize,
}

impl ResultLog {
    fn push(&mut self, result: JobResult) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            debug!("Result history full, dropped the oldest entry");
        }
        self.entries.push_back(result);
    }
}

pub struct TranslationQueue {
    /// One sender per worker; empty once shut down
    senders: Mutex<Vec<mpsc::UnboundedSender<String>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    /// Ids queued but not yet started
    pending: Arc<Mutex<HashSet<String>>>,
    /// Results of finished jobs not yet taken
    results: Arc<Mutex<ResultLog>>,
}

impl TranslationQueue {
    /// Start the default worker pool. Must be called within a tokio runtime.
    pub fn start(orchestrator: Arc<TranslationOrchestrator>) -> Self {
        Self::start_with(orchestrator, QueueOptions::default())
    }

    /// Start a worker pool sized by `options`. Must be called within a tokio runtime.
    pub fn start_with(orchestrator: Arc<TranslationOrchestrator>, options: QueueOptions) -> Self {
        let pending: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
        let results = Arc::new(Mutex::new(ResultLog {
            entries: VecDeque::new(),
            capacity: options.result_capacity,
        }));

        let worker_count = options.workers.max(1);
        let mut senders = Vec::with_capacity(worker_count);
        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let (sender, receiver) = mpsc::unbounded_channel::<String>();
            senders.push(sender);
            workers.push(tokio::spawn(run_worker(
                worker_id,
                receiver,
                orchestrator.clone(),
                pending.clone(),
                results.clone(),
            )));
        }
        debug!("Translation queue started with {} worker(s)", worker_count);

        Self {
            senders: Mutex::new(senders),
            workers: Mutex::new(workers),
            pending,
            results,
        }
    }

    /// Queue a translation run for a document.
    ///
    /// Returns false when an identical job is already waiting or the queue
    /// has been shut down. Safe to call any number of times.
    pub fn request_translation(&self, document_id: &str) -> bool {
        let senders = self.senders.lock();
        if senders.is_empty() {
            warn!("Translation queue is shut down, dropping request for {}", document_id);
            return false;
        }

        if !self.pending.lock().insert(document_id.to_string()) {
            debug!("Translation of {} already queued", document_id);
            return false;
        }

        let sender = &senders[worker_index(document_id, senders.len())];
        if sender.send(document_id.to_string()).is_err() {
            self.pending.lock().remove(document_id);
            warn!("Translation worker is gone, dropping request for {}", document_id);
            return false;
        }

        true
    }

    /// Number of jobs waiting to start
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Drain the results of finished jobs, oldest first
    pub fn take_results(&self) -> Vec<JobResult> {
        self.results.lock().entries.drain(..).collect()
    }

    /// Stop accepting jobs, finish the queued ones and wait for the workers
    pub async fn shutdown(&self) {
        // Dropping the senders lets each worker drain its channel and exit
        self.senders.lock().clear();

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(e) = worker.await {
                error!("Translation worker panicked: {}", e);
            }
        }
    }
}

impl CommitListener for TranslationQueue {
    fn on_commit(&self, event: &DocumentCommitted) {
        self.request_translation(&event.document_id);
    }
}

/// Worker owning every run for the ids routed to it
async fn run_worker(
    worker_id: usize,
    mut receiver: mpsc::UnboundedReceiver<String>,
    orchestrator: Arc<TranslationOrchestrator>,
    pending: Arc<Mutex<HashSet<String>>>,
    results: Arc<Mutex<ResultLog>>,
) {
    while let Some(document_id) = receiver.recv().await {
        pending.lock().remove(&document_id);
        debug!("Worker {} starting translation job for {}", worker_id, document_id);

        let result = orchestrator.translate_document(&document_id).await;
        match &result {
            Ok(report) if report.has_failures() => {
                warn!("Translation job for {} finished with failures", document_id)
            }
            Ok(_) => info!("Translation job for {} finished", document_id),
            Err(e) => error!("Translation job for {} failed: {}", document_id, e),
        }
        results.lock().push(result);
    }
    debug!("Translation queue worker {} stopped", worker_id);
}

/// Worker responsible for `document_id`
fn worker_index(document_id: &str, workers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    document_id.hash(&mut hasher);
    (hasher.finish() % workers.max(1) as u64) as usize
}
