use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::services::detector::DetectionResult;

/// Temporary files owned by one job, removed when the guard is dropped.
///
/// Dropping happens on every exit path of the job handler, unwinding
/// included. Files already gone are ignored; other failures are logged.
#[derive(Debug, Default)]
pub struct JobArtifacts {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl JobArtifacts {
    pub fn new(image_path: &Path) -> Self {
        Self {
            files: vec![image_path.to_path_buf()],
            dirs: Vec::new(),
        }
    }

    /// Take ownership of a detector run's outputs.
    pub fn track_detection(&mut self, detection: &DetectionResult) {
        self.files.push(detection.annotated_image_path.clone());
        self.files.push(detection.labels_path.clone());
        self.dirs.push(detection.run_dir.clone());
    }

    /// Take ownership of a run directory before its artifacts are known.
    pub fn track_dir(&mut self, dir: PathBuf) {
        self.dirs.push(dir);
    }

    /// Hand the tracked files to a new owner; nothing is removed on drop.
    pub fn release(mut self) {
        self.files.clear();
        self.dirs.clear();
    }

    fn cleanup(&mut self) {
        for file in self.files.drain(..) {
            match std::fs::remove_file(&file) {
                Ok(()) => tracing::debug!(path = %file.display(), "Removed temporary file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::error!(path = %file.display(), error = %e, "Error cleaning up file")
                }
            }
        }
        for dir in self.dirs.drain(..) {
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::error!(path = %dir.display(), error = %e, "Error cleaning up directory")
                }
            }
        }
    }
}

impl Drop for JobArtifacts {
    fn drop(&mut self) {
        self.cleanup();
    }
}
