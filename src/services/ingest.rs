use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Decode an uploaded photo and save it as `<images_dir>/<job_id>.jpg`.
///
/// Any format the `image` crate understands is accepted and re-encoded as
/// JPEG, which is what the detector is fed.
pub async fn store_image(
    images_dir: &Path,
    job_id: Uuid,
    bytes: Vec<u8>,
) -> Result<PathBuf, IngestError> {
    tokio::fs::create_dir_all(images_dir).await?;
    let path = images_dir.join(format!("{job_id}.jpg"));

    let target = path.clone();
    tokio::task::spawn_blocking(move || -> Result<(), IngestError> {
        let decoded = image::load_from_memory(&bytes)?;
        let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
        rgb.save_with_format(&target, ImageFormat::Jpeg)?;
        Ok(())
    })
    .await??;

    Ok(path)
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Failed to download image content: {0}")]
    Download(#[from] crate::services::line::LineError),

    #[error("Unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
