//! Fake collaborators and server helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use meal_calorie_bot::app_state::AppState;
use meal_calorie_bot::models::food::CalorieRecord;
use meal_calorie_bot::models::line::OutboundMessage;
use meal_calorie_bot::routes;
use meal_calorie_bot::services::detector::{DetectionError, DetectionResult, Detector};
use meal_calorie_bot::services::imgur::{ImageHost, PublishError};
use meal_calorie_bot::services::labels::{CalorieStore, LabelResolver};
use meal_calorie_bot::services::line::{ChatPlatform, LineError};
use meal_calorie_bot::services::queue::JobReceiver;
use meal_calorie_bot::services::signature::compute_signature;
use meal_calorie_bot::services::worker::Worker;

use crate::fixtures::CHANNEL_SECRET;

pub type Sent = (String, Vec<OutboundMessage>);

/// Records every reply and push; serves message content from a map.
#[derive(Default)]
pub struct FakeChat {
    pub content: Mutex<HashMap<String, Vec<u8>>>,
    pub replies: Mutex<Vec<Sent>>,
    pub pushes: Mutex<Vec<Sent>>,
    /// Held after recording a reply, like a slow LINE API.
    pub reply_delay: Option<Duration>,
    /// Panic after recording a push.
    pub panic_on_push: bool,
}

impl FakeChat {
    pub fn with_content(message_id: &str, bytes: Vec<u8>) -> Self {
        let chat = Self::default();
        chat.add_content(message_id, bytes);
        chat
    }

    pub fn add_content(&self, message_id: &str, bytes: Vec<u8>) {
        self.content
            .lock()
            .unwrap()
            .insert(message_id.to_string(), bytes);
    }

    pub fn replies(&self) -> Vec<Sent> {
        self.replies.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<Sent> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPlatform for FakeChat {
    async fn get_message_content(&self, message_id: &str) -> Result<Vec<u8>, LineError> {
        self.content
            .lock()
            .unwrap()
            .get(message_id)
            .cloned()
            .ok_or(LineError::Api {
                status: 404,
                body: "Not found".to_string(),
            })
    }

    async fn reply_message(
        &self,
        reply_token: &str,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), LineError> {
        self.replies
            .lock()
            .unwrap()
            .push((reply_token.to_string(), messages));
        if let Some(delay) = self.reply_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn push_message(
        &self,
        to: &str,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), LineError> {
        self.pushes.lock().unwrap().push((to.to_string(), messages));
        if self.panic_on_push {
            panic!("push endpoint blew up");
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq)]
pub enum DetectorMode {
    /// Write the annotated image and the configured labels.
    Succeed,
    /// Behave like a detector process exiting non-zero.
    Fail,
}

/// Writes detect.py-shaped output under `results_root/<run name>`.
pub struct FakeDetector {
    pub results_root: PathBuf,
    pub labels: Option<String>,
    pub mode: DetectorMode,
    pub calls: Mutex<Vec<PathBuf>>,
}

impl FakeDetector {
    pub fn new(results_root: &Path, labels: Option<&str>, mode: DetectorMode) -> Self {
        Self {
            results_root: results_root.to_path_buf(),
            labels: labels.map(str::to_string),
            mode,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Detector for FakeDetector {
    fn run_dir(&self, run_name: &str) -> PathBuf {
        self.results_root.join(run_name)
    }

    async fn detect(
        &self,
        image_path: &Path,
        run_name: &str,
    ) -> Result<DetectionResult, DetectionError> {
        self.calls.lock().unwrap().push(image_path.to_path_buf());
        if self.mode == DetectorMode::Fail {
            return Err(DetectionError::Exit(Some(1)));
        }

        let run_dir = self.run_dir(run_name);
        let result = DetectionResult::in_run_dir(&run_dir, image_path)?;
        std::fs::create_dir_all(run_dir.join("labels")).map_err(DetectionError::Spawn)?;
        std::fs::copy(image_path, &result.annotated_image_path).map_err(DetectionError::Spawn)?;
        if let Some(labels) = &self.labels {
            std::fs::write(&result.labels_path, labels).map_err(DetectionError::Spawn)?;
        }
        Ok(result)
    }
}

#[derive(Clone, Copy, PartialEq)]
pub enum HostMode {
    Succeed,
    Reject,
    Panic,
}

pub struct FakeHost {
    pub mode: HostMode,
    pub uploads: Mutex<Vec<PathBuf>>,
}

impl FakeHost {
    pub const URL: &'static str = "https://i.imgur.com/annotated.jpg";

    pub fn new(mode: HostMode) -> Self {
        Self {
            mode,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn uploads(&self) -> Vec<PathBuf> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageHost for FakeHost {
    async fn upload(&self, image_path: &Path) -> Result<String, PublishError> {
        self.uploads.lock().unwrap().push(image_path.to_path_buf());
        match self.mode {
            HostMode::Succeed => Ok(Self::URL.to_string()),
            HostMode::Reject => Err(PublishError::Rejected {
                status: 403,
                body: r#"{"data":{"error":"Invalid client_id"},"success":false,"status":403}"#
                    .to_string(),
            }),
            HostMode::Panic => panic!("image host blew up"),
        }
    }
}

/// Calorie table backed by a map; can be told to fail every lookup.
#[derive(Default)]
pub struct MapStore {
    pub records: HashMap<String, CalorieRecord>,
    pub fail: bool,
    pub queried: Mutex<Vec<String>>,
}

impl MapStore {
    pub fn with(records: &[(&str, f64, &str)]) -> Self {
        Self {
            records: records
                .iter()
                .map(|(name, calories, unit)| {
                    (
                        name.to_string(),
                        CalorieRecord {
                            calories: *calories,
                            unit: unit.to_string(),
                        },
                    )
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl CalorieStore for MapStore {
    async fn lookup(&self, name: &str) -> Result<Option<CalorieRecord>, sqlx::Error> {
        self.queried.lock().unwrap().push(name.to_string());
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.records.get(name).cloned())
    }
}

pub fn worker(
    chat: &Arc<FakeChat>,
    detector: Arc<dyn Detector>,
    host: &Arc<FakeHost>,
    store: Arc<MapStore>,
) -> Worker {
    Worker::new(chat.clone(), detector, host.clone(), LabelResolver::new(store))
}

/// Every regular file left below `dir`.
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return found;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            found.extend(files_under(&path));
        } else {
            found.push(path);
        }
    }
    found
}

/// Serve the application router on an ephemeral port.
pub async fn spawn_app(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, routes::router(state))
            .await
            .expect("test server");
    });
    addr
}

/// POST a webhook body signed with the test channel secret.
pub async fn post_signed(
    client: &reqwest::Client,
    addr: SocketAddr,
    body: Vec<u8>,
) -> reqwest::Response {
    let signature = compute_signature(CHANNEL_SECRET, &body).expect("sign body");
    client
        .post(format!("http://{addr}/callback"))
        .header("X-Line-Signature", signature)
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .expect("send webhook")
}

/// Wait for the next job with a timeout so a missing job fails instead of hanging.
pub async fn next_job(
    jobs: &mut JobReceiver,
) -> Option<meal_calorie_bot::models::job::QueueItem> {
    tokio::time::timeout(Duration::from_secs(5), jobs.recv())
        .await
        .ok()
        .flatten()
}
