use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::models::food::{food_name, CalorieRecord, CalorieSummary, ResolvedLabel};

/// Read-only calorie data keyed by food name.
#[async_trait]
pub trait CalorieStore: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<Option<CalorieRecord>, sqlx::Error>;
}

/// Parse the class index from a YOLO label line (`class conf x y w h`).
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_class_index(line: &str) -> Result<Option<i64>, LabelError> {
    let Some(token) = line.split_whitespace().next() else {
        return Ok(None);
    };
    token
        .parse::<i64>()
        .map(Some)
        .map_err(|_| LabelError::Malformed(line.trim().to_string()))
}

/// Turns detector label lines into named items with calorie data.
#[derive(Clone)]
pub struct LabelResolver {
    store: Arc<dyn CalorieStore>,
}

impl LabelResolver {
    pub fn new(store: Arc<dyn CalorieStore>) -> Self {
        Self { store }
    }

    pub async fn resolve_index(&self, class_index: i64) -> Result<ResolvedLabel, LabelError> {
        let name = food_name(class_index);
        let calories = self.store.lookup(&name).await?;
        if calories.is_none() {
            tracing::debug!(class_index, name = %name, "No calorie record");
        }
        Ok(ResolvedLabel { name, calories })
    }

    /// Resolve one label line; blank lines yield `None`.
    pub async fn resolve_line(&self, line: &str) -> Result<Option<ResolvedLabel>, LabelError> {
        match parse_class_index(line)? {
            Some(index) => self.resolve_index(index).await.map(Some),
            None => Ok(None),
        }
    }

    /// Resolve every line of a labels file. A missing file means nothing was detected.
    pub async fn summarize(&self, labels_path: &Path) -> Result<CalorieSummary, LabelError> {
        let contents = match tokio::fs::read_to_string(labels_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CalorieSummary::default());
            }
            Err(e) => return Err(LabelError::Io(e)),
        };

        let mut items = Vec::new();
        for line in contents.lines() {
            if let Some(label) = self.resolve_line(line).await? {
                items.push(label);
            }
        }
        Ok(CalorieSummary { items })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("Malformed label line: {0:?}")]
    Malformed(String),

    #[error("Failed to read labels file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Calorie lookup failed: {0}")]
    Lookup(#[from] sqlx::Error),
}
