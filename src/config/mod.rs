use garde::Validate;
use serde::Deserialize;
use std::path::PathBuf;

/// Directory holding photos downloaded from LINE until their job finishes.
pub const IMAGES_DIR: &str = "static/images";

/// Root under which the detector creates one run directory per job.
pub const DETECT_RESULTS_DIR: &str = "runs/detect";

#[derive(Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// LINE Messaging API channel access token
    #[garde(length(min = 1))]
    pub line_channel_access_token: String,

    /// LINE channel secret, used to verify webhook signatures
    #[garde(length(min = 1))]
    pub line_channel_secret: String,

    /// Imgur application client ID
    #[garde(length(min = 1))]
    pub imgur_client_id: String,

    /// YOLO installation directory (contains `detect.py`)
    #[garde(skip)]
    pub yolo_path: PathBuf,

    /// Trained weights file passed to the detector
    #[garde(skip)]
    pub weights_path: PathBuf,

    /// Directory containing `foods.db`
    #[garde(skip)]
    pub db_path: PathBuf,

    /// HTTP listen port
    #[serde(default = "default_port")]
    #[garde(range(min = 1))]
    pub port: u16,
}

fn default_port() -> u16 {
    5000
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] garde::Report),
}
