//! Background image-processing worker.
//!
//! A single consumer of the job queue. Jobs run one at a time in FIFO order:
//! detect, publish the annotated image, resolve calories, push the result.
//! Every job ends with exactly one push to the user and a cleanup pass over
//! its temporary files, whatever stage it stopped at.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::models::food::CalorieSummary;
use crate::models::job::{Job, JobOutcome, QueueItem};
use crate::services::cleanup::JobArtifacts;
use crate::services::detector::{DetectionError, Detector};
use crate::services::imgur::{ImageHost, PublishError};
use crate::services::labels::{LabelError, LabelResolver};
use crate::services::line::ChatPlatform;
use crate::services::queue::JobReceiver;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Detection failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("Publishing failed: {0}")]
    Publish(#[from] PublishError),

    #[error("Label resolution failed: {0}")]
    Labels(#[from] LabelError),
}

#[derive(Clone)]
pub struct Worker {
    chat: Arc<dyn ChatPlatform>,
    detector: Arc<dyn Detector>,
    host: Arc<dyn ImageHost>,
    resolver: LabelResolver,
}

impl Worker {
    pub fn new(
        chat: Arc<dyn ChatPlatform>,
        detector: Arc<dyn Detector>,
        host: Arc<dyn ImageHost>,
        resolver: LabelResolver,
    ) -> Self {
        Self {
            chat,
            detector,
            host,
            resolver,
        }
    }

    /// Consume jobs until the stop sentinel arrives or every producer is gone.
    pub async fn run(self, mut jobs: JobReceiver) {
        tracing::info!("Worker ready, waiting for jobs");

        while let Some(item) = jobs.recv().await {
            let job = match item {
                QueueItem::Job(job) => job,
                QueueItem::Stop => {
                    tracing::info!("Stop requested");
                    break;
                }
            };

            let job_id = job.id;
            let reply_to = job.reply_to.clone();
            let notified = Arc::new(AtomicBool::new(false));
            let worker = self.clone();
            let flag = notified.clone();

            // Own task per job so a panic cannot take the loop down.
            let task = tokio::spawn(async move { worker.process_job(job, &flag).await });
            if let Err(e) = task.await {
                tracing::error!(job_id = %job_id, error = %e, "Job task aborted");
                metrics::counter!("meal_jobs_failed", "reason" => "panic").increment(1);
                if !notified.load(Ordering::SeqCst) {
                    self.notify_isolated(reply_to).await;
                }
            }
        }

        tracing::info!("Worker stopped");
    }

    /// Process one job to its terminal outcome and push the result.
    pub async fn process(&self, job: Job) -> JobOutcome {
        self.process_job(job, &AtomicBool::new(false)).await
    }

    /// `notified` is set once the terminal push has been attempted.
    async fn process_job(&self, job: Job, notified: &AtomicBool) -> JobOutcome {
        let start = Instant::now();
        metrics::counter!("meal_jobs_total").increment(1);

        tracing::info!(
            job_id = %job.id,
            image = %job.image_path.display(),
            "Processing image job"
        );

        let mut artifacts = JobArtifacts::new(&job.image_path);

        let outcome = match self.run_pipeline(&job, &mut artifacts).await {
            Ok((image_url, summary)) => {
                tracing::info!(
                    job_id = %job.id,
                    items = summary.items.len(),
                    total_calories = summary.total_calories(),
                    "Job completed successfully"
                );
                JobOutcome::Completed { image_url, summary }
            }
            Err(PipelineError::Detection(e)) => {
                tracing::warn!(job_id = %job.id, error = %e, "No result generated");
                JobOutcome::NoResult
            }
            Err(PipelineError::Publish(e)) => {
                tracing::warn!(job_id = %job.id, error = %e, "Upload failed");
                JobOutcome::UploadFailed
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Error processing image");
                JobOutcome::Failed
            }
        };

        notified.store(true, Ordering::SeqCst);
        self.notify(&job.reply_to, &outcome).await;
        drop(artifacts);

        metrics::histogram!("meal_job_processing_seconds").record(start.elapsed().as_secs_f64());
        match &outcome {
            JobOutcome::Completed { .. } => {
                metrics::counter!("meal_jobs_completed").increment(1);
            }
            other => {
                metrics::counter!("meal_jobs_failed", "reason" => other.kind()).increment(1);
            }
        }

        outcome
    }

    async fn run_pipeline(
        &self,
        job: &Job,
        artifacts: &mut JobArtifacts,
    ) -> Result<(String, CalorieSummary), PipelineError> {
        let run_name = job.id.to_string();
        artifacts.track_dir(self.detector.run_dir(&run_name));

        tracing::debug!(job_id = %job.id, "Detecting");
        let detection = self.detector.detect(&job.image_path, &run_name).await?;
        artifacts.track_detection(&detection);

        tracing::debug!(job_id = %job.id, "Publishing");
        let image_url = self.host.upload(&detection.annotated_image_path).await?;

        tracing::debug!(job_id = %job.id, "Resolving labels");
        let summary = self.resolver.summarize(&detection.labels_path).await?;

        Ok((image_url, summary))
    }

    /// Generic failure push for a job whose task died before notifying.
    async fn notify_isolated(&self, to: String) {
        let worker = self.clone();
        let push = tokio::spawn(async move { worker.notify(&to, &JobOutcome::Failed).await });
        if let Err(e) = push.await {
            tracing::error!(error = %e, "Failure notification aborted");
        }
    }

    async fn notify(&self, to: &str, outcome: &JobOutcome) {
        if let Err(e) = self.chat.push_message(to, outcome.messages()).await {
            tracing::error!(to, outcome = outcome.kind(), error = %e, "Failed to push result");
        }
    }
}
