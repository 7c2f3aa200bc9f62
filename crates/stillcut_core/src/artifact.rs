//! Published output videos.
//!
//! A successful run hands its output bytes to the [`ArtifactStore`], which
//! writes them under a unique name and returns an [`ArtifactHandle`]. The
//! session revokes the previous handle before each new run, so at most one
//! artifact per session is live at a time.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the artifact store.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The handle's file is gone (revoked or removed externally).
    #[error("Artifact {0} is no longer available")]
    Revoked(Uuid),
}

impl ArtifactError {
    fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Reference to one published output video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHandle {
    pub id: Uuid,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Directory holding published artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` as a new artifact named after `source_stem`.
    ///
    /// The file appears under its final name only once fully written.
    pub fn publish(&self, bytes: &[u8], source_stem: &str) -> ArtifactResult<ArtifactHandle> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| ArtifactError::io("creating artifact directory", e))?;

        let id = Uuid::new_v4();
        let short_id = &id.simple().to_string()[..8];
        let path = self
            .dir
            .join(format!("{}_stillcut_{}.mp4", source_stem, short_id));
        let temp_path = path.with_extension("mp4.tmp");

        {
            let mut file = fs::File::create(&temp_path)
                .map_err(|e| ArtifactError::io("creating artifact", e))?;
            file.write_all(bytes)
                .and_then(|_| file.sync_all())
                .map_err(|e| ArtifactError::io("writing artifact", e))?;
        }
        fs::rename(&temp_path, &path).map_err(|e| ArtifactError::io("publishing artifact", e))?;

        tracing::debug!("Published artifact {} ({} bytes)", path.display(), bytes.len());

        Ok(ArtifactHandle {
            id,
            path,
            size_bytes: bytes.len() as u64,
        })
    }

    /// Remove an artifact. Revoking an already-removed artifact is a no-op.
    pub fn revoke(&self, handle: &ArtifactHandle) -> ArtifactResult<()> {
        match fs::remove_file(&handle.path) {
            Ok(()) => {
                tracing::debug!("Revoked artifact {}", handle.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ArtifactError::io("revoking artifact", e)),
        }
    }

    /// Copy an artifact to `dest`, returning the bytes copied.
    pub fn export(&self, handle: &ArtifactHandle, dest: impl AsRef<Path>) -> ArtifactResult<u64> {
        if !handle.path.exists() {
            return Err(ArtifactError::Revoked(handle.id));
        }

        let dest = dest.as_ref();
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ArtifactError::io("creating export directory", e))?;
        }
        fs::copy(&handle.path, dest).map_err(|e| ArtifactError::io("exporting artifact", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn publish_writes_unique_files() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("out"));

        let first = store.publish(b"video-a", "clip").unwrap();
        let second = store.publish(b"video-b", "clip").unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(first.path, second.path);
        assert_eq!(first.size_bytes, 7);
        assert_eq!(fs::read(&first.path).unwrap(), b"video-a");
        assert!(first
            .path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("clip_stillcut_"));
    }

    #[test]
    fn publish_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.publish(b"bytes", "clip").unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn revoke_removes_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let handle = store.publish(b"bytes", "clip").unwrap();
        store.revoke(&handle).unwrap();
        assert!(!handle.path.exists());
        store.revoke(&handle).unwrap();
    }

    #[test]
    fn export_copies_live_artifact() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("out"));
        let handle = store.publish(b"frames", "clip").unwrap();

        let dest = dir.path().join("exports").join("final.mp4");
        let copied = store.export(&handle, &dest).unwrap();

        assert_eq!(copied, 6);
        assert_eq!(fs::read(&dest).unwrap(), b"frames");
    }

    #[test]
    fn export_of_revoked_artifact_fails() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let handle = store.publish(b"frames", "clip").unwrap();
        store.revoke(&handle).unwrap();

        let result = store.export(&handle, dir.path().join("final.mp4"));
        assert!(matches!(result, Err(ArtifactError::Revoked(id)) if id == handle.id));
    }
}
