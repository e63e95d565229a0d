use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::job::{Job, ERROR_TEXT, RECEIVED_TEXT};
use crate::models::line::{EventMessage, EventSource, OutboundMessage, WebhookEvent, WebhookPayload};
use crate::services::cleanup::JobArtifacts;
use crate::services::ingest::{self, IngestError};
use crate::services::signature::{verify_signature, SIGNATURE_HEADER};

/// POST /callback — LINE webhook endpoint.
///
/// Rejects requests without a valid signature before looking at the body.
/// Each event is handled in order; image jobs are only enqueued here and
/// processed by the background worker. Event handling runs in its own task
/// so a client hanging up cannot leave a stored image without a job.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Webhook request without signature");
            StatusCode::BAD_REQUEST
        })?;

    if !verify_signature(&state.channel_secret, &body, signature) {
        tracing::warn!("Invalid webhook signature");
        return Err(StatusCode::BAD_REQUEST);
    }

    tracing::debug!(body = %String::from_utf8_lossy(&body), "Webhook request body");

    let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Malformed webhook payload");
        StatusCode::BAD_REQUEST
    })?;

    let events = tokio::spawn(async move {
        for event in payload.events {
            handle_event(&state, event).await;
        }
    });
    if let Err(e) = events.await {
        tracing::error!(error = %e, "Webhook event handling aborted");
    }

    Ok("OK")
}

async fn handle_event(state: &AppState, event: WebhookEvent) {
    match event {
        WebhookEvent::Message {
            reply_token,
            source,
            message: EventMessage::Image { id },
        } => handle_image_message(state, reply_token.as_deref(), &source, &id).await,
        _ => tracing::debug!("Ignoring non-image event"),
    }
}

async fn handle_image_message(
    state: &AppState,
    reply_token: Option<&str>,
    source: &EventSource,
    message_id: &str,
) {
    let Some(reply_to) = source.push_target() else {
        tracing::warn!(source = %source.kind, message_id, "Image message without a push target");
        reply(state, reply_token, ERROR_TEXT).await;
        return;
    };

    let job_id = Uuid::new_v4();
    let image_path = match download_and_store(state, job_id, message_id).await {
        Ok(path) => path,
        Err(e) => {
            tracing::error!(message_id, error = %e, "Error processing image");
            reply(state, reply_token, ERROR_TEXT).await;
            return;
        }
    };
    // Owned here until the queue takes the job.
    let stored = JobArtifacts::new(&image_path);

    reply(state, reply_token, RECEIVED_TEXT).await;

    let job = Job {
        id: job_id,
        image_path,
        reply_to: reply_to.to_string(),
    };
    match state.queue.enqueue(job) {
        Ok(()) => {
            stored.release();
            tracing::info!(job_id = %job_id, message_id, "Image job enqueued");
        }
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Failed to enqueue image job");
            drop(stored);
            if let Err(e) = state
                .chat
                .push_message(reply_to, vec![OutboundMessage::text(ERROR_TEXT)])
                .await
            {
                tracing::error!(error = %e, "Failed to push enqueue failure");
            }
        }
    }
}

async fn download_and_store(
    state: &AppState,
    job_id: Uuid,
    message_id: &str,
) -> Result<std::path::PathBuf, IngestError> {
    let content = state.chat.get_message_content(message_id).await?;
    ingest::store_image(&state.images_dir, job_id, content).await
}

async fn reply(state: &AppState, reply_token: Option<&str>, text: &str) {
    let Some(token) = reply_token else {
        tracing::debug!("Event has no reply token, skipping reply");
        return;
    };
    if let Err(e) = state
        .chat
        .reply_message(token, vec![OutboundMessage::text(text)])
        .await
    {
        tracing::error!(error = %e, "Failed to send reply");
    }
}
