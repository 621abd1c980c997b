//! Content store backed by the SQLite `story_segments` table
//!
//! The store may be constructed without a backend; every query then fails
//! with `BackendUnavailable` and callers fall back to the mock table.

use futures::TryStreamExt;
use rq_common::db::{init_database, init_in_memory};
use rq_common::{Choice, Error, Result, Segment};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;

const SEGMENT_COLUMNS: &str = "id, title, content, choices, embedding, audio_url";

/// Handle to the story database; cheap to clone
#[derive(Clone, Default)]
pub struct ContentStore {
    pool: Option<SqlitePool>,
}

impl ContentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Some(pool) }
    }

    /// Store with no backend; reads report `BackendUnavailable`
    pub fn unavailable() -> Self {
        Self { pool: None }
    }

    /// Open (creating if needed) the database file
    pub async fn connect(db_path: &Path) -> Result<Self> {
        Ok(Self::new(init_database(db_path).await?))
    }

    pub async fn in_memory() -> Result<Self> {
        Ok(Self::new(init_in_memory().await?))
    }

    pub fn is_available(&self) -> bool {
        self.pool.is_some()
    }

    fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .as_ref()
            .ok_or_else(|| Error::BackendUnavailable("content store not configured".to_string()))
    }

    /// Key lookup
    pub async fn get(&self, id: &str) -> Result<Option<Segment>> {
        let query = format!("SELECT {} FROM story_segments WHERE id = ?", SEGMENT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.pool()?)
            .await?;

        row.as_ref().map(row_to_segment).transpose()
    }

    /// Case-insensitive substring match on title or content, in insertion order
    ///
    /// SQLite folds ASCII case only.
    pub async fn search_text(&self, query: &str, limit: i64) -> Result<Vec<Segment>> {
        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            "SELECT {} FROM story_segments
             WHERE title LIKE ?1 ESCAPE '\\' OR content LIKE ?1 ESCAPE '\\'
             ORDER BY rowid
             LIMIT ?2",
            SEGMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(self.pool()?)
            .await?;

        rows.iter().map(row_to_segment).collect()
    }

    /// Stream every segment that carries an embedding through `visit`
    ///
    /// Rows are decoded one at a time, so the full index is never held in
    /// memory. Returns the number of segments visited.
    pub async fn for_each_indexed<F>(&self, mut visit: F) -> Result<usize>
    where
        F: FnMut(Segment),
    {
        let sql = format!(
            "SELECT {} FROM story_segments WHERE embedding IS NOT NULL ORDER BY rowid",
            SEGMENT_COLUMNS
        );
        let mut rows = sqlx::query(&sql).fetch(self.pool()?);

        let mut visited = 0;
        while let Some(row) = rows.try_next().await? {
            visit(row_to_segment(&row)?);
            visited += 1;
        }
        Ok(visited)
    }

    pub async fn all(&self) -> Result<Vec<Segment>> {
        let sql = format!("SELECT {} FROM story_segments ORDER BY rowid", SEGMENT_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(self.pool()?).await?;

        rows.iter().map(row_to_segment).collect()
    }

    /// Insert or replace a whole segment
    pub async fn upsert(&self, segment: &Segment) -> Result<()> {
        let choices = serde_json::to_string(&segment.choices)?;
        let embedding = segment
            .embedding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO story_segments (id, title, content, choices, embedding, audio_url)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                choices = excluded.choices,
                embedding = excluded.embedding,
                audio_url = excluded.audio_url
            "#,
        )
        .bind(&segment.id)
        .bind(&segment.title)
        .bind(&segment.content)
        .bind(choices)
        .bind(embedding)
        .bind(&segment.audio_url)
        .execute(self.pool()?)
        .await?;

        Ok(())
    }

    /// Returns false when no segment has this id
    pub async fn set_embedding(&self, id: &str, embedding: &[f32]) -> Result<bool> {
        let encoded = serde_json::to_string(embedding)?;
        let result = sqlx::query("UPDATE story_segments SET embedding = ? WHERE id = ?")
            .bind(encoded)
            .bind(id)
            .execute(self.pool()?)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns false when no segment has this id (e.g. a mock segment)
    pub async fn set_audio_url(&self, id: &str, audio_url: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE story_segments SET audio_url = ? WHERE id = ?")
            .bind(audio_url)
            .bind(id)
            .execute(self.pool()?)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM story_segments")
            .fetch_one(self.pool()?)
            .await?;
        Ok(count)
    }
}

fn row_to_segment(row: &SqliteRow) -> Result<Segment> {
    let choices: String = row.try_get("choices")?;
    let choices: Vec<Choice> = serde_json::from_str(&choices)?;

    let embedding: Option<String> = row.try_get("embedding")?;
    let embedding = embedding
        .as_deref()
        .map(serde_json::from_str::<Vec<f32>>)
        .transpose()?;

    Ok(Segment {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        choices,
        embedding,
        audio_url: row.try_get("audio_url")?,
    })
}

/// Escape LIKE wildcards so the query matches literally
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_store() -> ContentStore {
        let store = ContentStore::in_memory().await.unwrap();
        let intro = Segment::new("intro", "The Journey Begins", "You awaken to the hum of the rainforest.")
            .with_choice(Choice::new("follow_tracks", "Follow the animal tracks", "follow_tracks"));
        let tracks = Segment::new("follow_tracks", "Into the Jungle", "A massive baobab tree stands in the clearing.");
        store.upsert(&intro).await.unwrap();
        store.upsert(&tracks).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_get_round_trips_choices() {
        let store = seeded_store().await;

        let intro = store.get("intro").await.unwrap().unwrap();
        assert_eq!(intro.title, "The Journey Begins");
        assert_eq!(intro.choices.len(), 1);
        assert_eq!(intro.choices[0].target_segment_id, "follow_tracks");
        assert!(intro.embedding.is_none());

        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_text_matches_title_or_content() {
        let store = seeded_store().await;

        let by_title = store.search_text("JUNGLE", 10).await.unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].id, "follow_tracks");

        let by_content = store.search_text("rainforest", 10).await.unwrap();
        assert_eq!(by_content[0].id, "intro");

        assert!(store.search_text("volcano", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_text_treats_wildcards_literally() {
        let store = seeded_store().await;
        assert!(store.search_text("%", 10).await.unwrap().is_empty());
        assert!(store.search_text("_", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_text_respects_limit() {
        let store = seeded_store().await;
        let hits = store.search_text("the", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_embedding_and_audio_updates() {
        let store = seeded_store().await;

        assert!(store.set_embedding("intro", &[0.6, 0.8]).await.unwrap());
        assert!(!store.set_embedding("missing", &[1.0]).await.unwrap());

        let mut indexed = Vec::new();
        let visited = store.for_each_indexed(|s| indexed.push(s)).await.unwrap();
        assert_eq!(visited, 1);
        assert_eq!(indexed.len(), 1);
        assert_eq!(indexed[0].embedding.as_deref(), Some(&[0.6, 0.8][..]));

        assert!(store.set_audio_url("intro", "/audio/intro.mp3").await.unwrap());
        let intro = store.get("intro").await.unwrap().unwrap();
        assert_eq!(intro.audio_url.as_deref(), Some("/audio/intro.mp3"));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_reports_backend_unavailable() {
        let store = ContentStore::unavailable();
        assert!(!store.is_available());
        assert!(matches!(
            store.get("intro").await,
            Err(Error::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
