//! Database initialization
//!
//! Opens (creating if needed) the story database and creates the schema.
//! Schema creation is idempotent and safe to run on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets request handlers read while the audio URL writer commits
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_story_segments_table(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Limited to one connection: every SQLite `:memory:` connection is a
/// separate database.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    create_story_segments_table(&pool).await?;

    Ok(pool)
}

/// Story segments; `choices` and `embedding` hold JSON arrays
pub async fn create_story_segments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS story_segments (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            choices TEXT NOT NULL DEFAULT '[]',
            embedding TEXT,
            audio_url TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
