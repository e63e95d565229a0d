use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::models::job::{Job, QueueItem};

/// Producer side of the in-process job queue. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<QueueItem>,
    depth: Arc<AtomicUsize>,
}

/// Consumer side, owned by the single worker.
pub struct JobReceiver {
    rx: mpsc::UnboundedReceiver<QueueItem>,
    depth: Arc<AtomicUsize>,
}

impl JobQueue {
    /// Create an unbounded FIFO queue.
    pub fn new() -> (JobQueue, JobReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        (
            JobQueue {
                tx,
                depth: depth.clone(),
            },
            JobReceiver { rx, depth },
        )
    }

    /// Enqueue a job. Never blocks; fails only when the worker has gone away.
    pub fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        // Count before sending so the receiver never decrements below zero.
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        if let Err(mpsc::error::SendError(item)) = self.tx.send(QueueItem::Job(job)) {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueError::Closed(item));
        }
        metrics::gauge!("meal_jobs_queue_depth").set(depth as f64);
        Ok(())
    }

    /// Ask the worker to exit after the jobs already queued.
    pub fn stop(&self) -> Result<(), QueueError> {
        self.tx.send(QueueItem::Stop).map_err(|e| QueueError::Closed(e.0))
    }

    /// Number of jobs waiting to be dequeued.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

impl JobReceiver {
    /// Wait for the next item. `None` once every producer has been dropped.
    pub async fn recv(&mut self) -> Option<QueueItem> {
        let item = self.rx.recv().await?;
        if let QueueItem::Job(_) = item {
            let depth = self.depth.fetch_sub(1, Ordering::SeqCst) - 1;
            metrics::gauge!("meal_jobs_queue_depth").set(depth as f64);
        }
        Some(item)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Job queue is closed")]
    Closed(QueueItem),
}
