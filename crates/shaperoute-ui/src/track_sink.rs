//! Destinations for downloaded GPX tracks.

use async_trait::async_trait;
use shaperoute_core::SaveError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persists a downloaded track under a suggested file name.
#[async_trait]
pub trait TrackSink: Send + Sync {
    /// Returns where the file was written, or [`SaveError::Cancelled`] when
    /// the user backed out.
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf, SaveError>;
}

async fn write_track(path: PathBuf, bytes: Vec<u8>) -> Result<PathBuf, SaveError> {
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| SaveError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}

/// Asks for the destination with a native save dialog.
#[derive(Debug, Clone)]
pub struct DialogTrackSink {
    default_dir: PathBuf,
}

impl DialogTrackSink {
    pub fn new(default_dir: impl Into<PathBuf>) -> Self {
        Self {
            default_dir: default_dir.into(),
        }
    }
}

#[async_trait]
impl TrackSink for DialogTrackSink {
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf, SaveError> {
        let dir = self.default_dir.clone();
        let name = file_name.to_string();

        // The dialog blocks until dismissed.
        let picked = tokio::task::spawn_blocking(move || {
            rfd::FileDialog::new()
                .set_title("Save GPX track")
                .set_directory(&dir)
                .set_file_name(name)
                .add_filter("GPX Files", &["gpx"])
                .save_file()
        })
        .await
        .map_err(|e| SaveError::Write {
            path: file_name.to_string(),
            reason: e.to_string(),
        })?;

        match picked {
            Some(path) => write_track(path, bytes).await,
            None => Err(SaveError::Cancelled),
        }
    }
}

/// Writes tracks into a fixed directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectoryTrackSink {
    dir: PathBuf,
}

impl DirectoryTrackSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl TrackSink for DirectoryTrackSink {
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf, SaveError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SaveError::Write {
                path: self.dir.display().to_string(),
                reason: e.to_string(),
            })?;

        // Only the final component is used so a name cannot escape `dir`.
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| SaveError::Write {
                path: file_name.to_string(),
                reason: "not a file name".to_string(),
            })?;
        write_track(self.dir.join(name), bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectoryTrackSink::new(dir.path().join("tracks"));

        let path = sink
            .save("star_01_5.2347km.gpx", b"<gpx/>".to_vec())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("tracks").join("star_01_5.2347km.gpx"));
        assert_eq!(std::fs::read(&path).unwrap(), b"<gpx/>");
    }

    #[tokio::test]
    async fn test_directory_sink_strips_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectoryTrackSink::new(dir.path());

        let path = sink.save("../escape.gpx", b"x".to_vec()).await.unwrap();
        assert_eq!(path, dir.path().join("escape.gpx"));
    }

    #[tokio::test]
    async fn test_directory_sink_rejects_empty_name() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectoryTrackSink::new(dir.path());

        let err = sink.save("..", Vec::new()).await.unwrap_err();
        assert!(matches!(err, SaveError::Write { .. }));
    }
}
