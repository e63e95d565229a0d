use std::path::PathBuf;
use uuid::Uuid;

use crate::models::food::CalorieSummary;
use crate::models::line::OutboundMessage;

pub const RECEIVED_TEXT: &str = "Your image has been received and is being processed...";
pub const NO_RESULT_TEXT: &str = "No result image generated, please try again";
pub const UPLOAD_FAILED_TEXT: &str = "Failed to upload image to Imgur, please try again";
pub const ERROR_TEXT: &str = "An error occurred while processing the image, please try again.";

/// One uploaded photo awaiting detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub image_path: PathBuf,
    /// LINE push target (user, group or room id) that receives the result.
    pub reply_to: String,
}

/// What travels through the job queue.
#[derive(Debug)]
pub enum QueueItem {
    Job(Job),
    /// Tells the worker to exit its loop.
    Stop,
}

/// Terminal result of a job. Each variant maps to exactly one push.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed {
        image_url: String,
        summary: CalorieSummary,
    },
    NoResult,
    UploadFailed,
    Failed,
}

impl JobOutcome {
    /// Messages pushed to the user for this outcome.
    pub fn messages(&self) -> Vec<OutboundMessage> {
        match self {
            JobOutcome::Completed { image_url, summary } => vec![
                OutboundMessage::image(image_url),
                OutboundMessage::text(summary.to_message_text()),
            ],
            JobOutcome::NoResult => vec![OutboundMessage::text(NO_RESULT_TEXT)],
            JobOutcome::UploadFailed => vec![OutboundMessage::text(UPLOAD_FAILED_TEXT)],
            JobOutcome::Failed => vec![OutboundMessage::text(ERROR_TEXT)],
        }
    }

    /// Short label used for logs and the `reason` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            JobOutcome::Completed { .. } => "completed",
            JobOutcome::NoResult => "no_result",
            JobOutcome::UploadFailed => "upload_failed",
            JobOutcome::Failed => "error",
        }
    }
}
