use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use std::path::Path;

const UPLOAD_URL: &str = "https://api.imgur.com/3/upload";

/// Public image hosting used to make annotated results reachable by LINE.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload a local image and return its public URL.
    async fn upload(&self, image_path: &Path) -> Result<String, PublishError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Deserialize)]
struct UploadData {
    link: String,
}

/// Anonymous Imgur uploads authenticated with an application client ID.
pub struct ImgurClient {
    http: Client,
    client_id: String,
    upload_url: String,
}

impl ImgurClient {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self::with_upload_url(client_id, UPLOAD_URL)
    }

    pub fn with_upload_url(client_id: impl Into<String>, upload_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            client_id: client_id.into(),
            upload_url: upload_url.into(),
        }
    }
}

#[async_trait]
impl ImageHost for ImgurClient {
    async fn upload(&self, image_path: &Path) -> Result<String, PublishError> {
        let bytes = tokio::fs::read(image_path).await?;
        let file_name = image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());

        let form = multipart::Form::new().part(
            "image",
            multipart::Part::bytes(bytes).file_name(file_name),
        );

        let response = self
            .http
            .post(&self.upload_url)
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Imgur upload failed");
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let upload: UploadResponse = response.json().await?;
        Ok(upload.data.link)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to read image for upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request to Imgur failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Imgur rejected upload with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
