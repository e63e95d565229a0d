use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

/// File name of the calorie database inside `DB_PATH`.
pub const DATABASE_FILE: &str = "foods.db";

/// Open the calorie database read-only.
pub async fn init_pool(db_dir: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(db_dir.join(DATABASE_FILE))
        .read_only(true);

    SqlitePoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .connect_with(options)
        .await
}

pub mod queries;
