use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::models::food::CalorieRecord;
use crate::services::labels::CalorieStore;

/// Look up the calorie record of a food by exact name.
///
/// A row whose `calories` column is NULL counts as no record.
pub async fn get_calories_by_name(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<CalorieRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT CAST(calories AS REAL) AS calories, unit
        FROM foods
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let calories: Option<f64> = row.try_get("calories")?;
    let unit: Option<String> = row.try_get("unit")?;

    Ok(calories.map(|calories| CalorieRecord {
        calories,
        unit: unit.unwrap_or_default(),
    }))
}

#[async_trait]
impl CalorieStore for SqlitePool {
    async fn lookup(&self, name: &str) -> Result<Option<CalorieRecord>, sqlx::Error> {
        get_calories_by_name(self, name).await
    }
}
