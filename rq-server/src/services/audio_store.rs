//! On-disk store for synthesized narration
//!
//! One MP3 per segment at `<audio_dir>/<segment_id>.mp3`.

use rq_common::models::is_valid_id;
use rq_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Distinguishes temporary files of concurrent saves
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
}

impl AudioStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a segment's audio; rejects ids that could escape the directory
    pub fn path_for(&self, segment_id: &str) -> Result<PathBuf> {
        if !is_valid_id(segment_id) {
            return Err(Error::InvalidInput(format!(
                "invalid segment id for audio: '{}'",
                segment_id
            )));
        }
        Ok(self.dir.join(format!("{}.mp3", segment_id)))
    }

    /// URL the audio route serves this segment's narration from
    pub fn audio_url(segment_id: &str) -> String {
        format!("/audio/{}.mp3", segment_id)
    }

    /// True once a complete, non-empty audio file is in place
    pub async fn exists(&self, segment_id: &str) -> bool {
        let Ok(path) = self.path_for(segment_id) else {
            return false;
        };
        match fs::metadata(&path).await {
            Ok(meta) => meta.is_file() && meta.len() > 0,
            Err(_) => false,
        }
    }

    /// Write audio under a temporary name, then rename it into place
    ///
    /// Readers see either no file or the complete file, never a partial one.
    pub async fn save(&self, segment_id: &str, audio: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(segment_id)?;
        fs::create_dir_all(&self.dir).await?;

        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self
            .dir
            .join(format!("{}.mp3.{}-{}.tmp", segment_id, std::process::id(), seq));

        if let Err(e) = write_then_rename(&tmp_path, &path, audio).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(path)
    }

    /// Audio bytes, or None when nothing (or only an empty file) is there yet
    pub async fn load(&self, segment_id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(segment_id)?;
        match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_then_rename(tmp_path: &Path, path: &Path, audio: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp_path).await?;
    file.write_all(audio).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(tmp_path, path).await
}
