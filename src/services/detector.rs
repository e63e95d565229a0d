//! External YOLO detector invocation.
//!
//! Each job gets its own run directory `<results root>/<run name>`, passed to
//! `detect.py` through `--project`/`--name`, so finding the output never
//! depends on which directory was created last.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Output artifacts of a single detector run.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub run_dir: PathBuf,
    pub annotated_image_path: PathBuf,
    /// May not exist when nothing was detected.
    pub labels_path: PathBuf,
}

impl DetectionResult {
    /// Artifact locations for `image_path` inside `run_dir`.
    pub fn in_run_dir(run_dir: &Path, image_path: &Path) -> Result<Self, DetectionError> {
        let file_name = image_path
            .file_name()
            .ok_or_else(|| DetectionError::InvalidSource(image_path.to_path_buf()))?;
        let stem = image_path
            .file_stem()
            .ok_or_else(|| DetectionError::InvalidSource(image_path.to_path_buf()))?;

        let mut labels_file = stem.to_os_string();
        labels_file.push(".txt");

        Ok(Self {
            run_dir: run_dir.to_path_buf(),
            annotated_image_path: run_dir.join(file_name),
            labels_path: run_dir.join("labels").join(labels_file),
        })
    }
}

/// Object detector producing an annotated image plus a YOLO label file.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Directory a run named `run_name` writes into.
    fn run_dir(&self, run_name: &str) -> PathBuf;

    /// Run detection on `image_path`, writing output under a directory named `run_name`.
    async fn detect(&self, image_path: &Path, run_name: &str)
        -> Result<DetectionResult, DetectionError>;
}

/// Runs `detect.py` from a YOLOv7 checkout as a child process.
pub struct YoloDetector {
    program: OsString,
    script: PathBuf,
    weights: PathBuf,
    results_root: PathBuf,
}

impl YoloDetector {
    pub fn new(yolo_path: &Path, weights: &Path, results_root: &Path) -> Self {
        Self::with_program("python", yolo_path.join("detect.py"), weights, results_root)
    }

    /// Detector launched as `<program> <script> ...`.
    pub fn with_program(
        program: impl Into<OsString>,
        script: impl Into<PathBuf>,
        weights: &Path,
        results_root: &Path,
    ) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
            weights: weights.to_path_buf(),
            results_root: results_root.to_path_buf(),
        }
    }

    fn command(&self, image_path: &Path, run_name: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.script)
            .arg("--weights")
            .arg(&self.weights)
            .arg("--source")
            .arg(image_path)
            .arg("--save-txt")
            .arg("--save-conf")
            .arg("--project")
            .arg(&self.results_root)
            .arg("--name")
            .arg(run_name)
            .arg("--exist-ok")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl Detector for YoloDetector {
    fn run_dir(&self, run_name: &str) -> PathBuf {
        self.results_root.join(run_name)
    }

    async fn detect(
        &self,
        image_path: &Path,
        run_name: &str,
    ) -> Result<DetectionResult, DetectionError> {
        let start = std::time::Instant::now();
        let output = self
            .command(image_path, run_name)
            .output()
            .await
            .map_err(DetectionError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                run = run_name,
                status = %output.status,
                stderr = %stderr.trim(),
                "Detector exited with failure"
            );
            return Err(DetectionError::Exit(output.status.code()));
        }

        tracing::info!(
            run = run_name,
            duration_ms = start.elapsed().as_millis() as u64,
            "Detector finished"
        );

        let run_dir = self.run_dir(run_name);
        if !run_dir.is_dir() {
            return Err(DetectionError::NoRunDirectory(run_dir));
        }

        let result = DetectionResult::in_run_dir(&run_dir, image_path)?;
        if !result.annotated_image_path.is_file() {
            return Err(DetectionError::MissingAnnotatedImage(
                result.annotated_image_path,
            ));
        }
        Ok(result)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Failed to launch detector: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Detector exited with status {0:?}")]
    Exit(Option<i32>),

    #[error("Detector produced no run directory at {}", .0.display())]
    NoRunDirectory(PathBuf),

    #[error("Annotated image not found at {}", .0.display())]
    MissingAnnotatedImage(PathBuf),

    #[error("Source path has no file name: {}", .0.display())]
    InvalidSource(PathBuf),
}
