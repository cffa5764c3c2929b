//! Staging of input and output buffers in the engine namespace.

use std::io;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::FsError;
use crate::engine::EngineFs;

/// Moves byte buffers in and out of an engine's virtual filesystem.
#[derive(Clone)]
pub struct FsBridge {
    fs: Arc<dyn EngineFs>,
}

impl FsBridge {
    pub fn new(fs: Arc<dyn EngineFs>) -> Self {
        Self { fs }
    }

    /// Writes `data` at `path`, creating every missing parent directory.
    pub async fn write_file(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let file_name = path.rsplit('/').next().unwrap_or_default();
        if file_name.is_empty() {
            return Err(FsError::InvalidPath {
                path: path.to_string(),
            });
        }

        let absolute = path.starts_with('/');
        let mut current = String::new();
        let dirs: Vec<&str> = path.split('/').collect();
        for dir in &dirs[..dirs.len() - 1] {
            if dir.is_empty() {
                continue;
            }
            if absolute || !current.is_empty() {
                current.push('/');
            }
            current.push_str(dir);

            match self.fs.mkdir(&current).await {
                Ok(()) => debug!(dir = %current, "Created engine directory"),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(FsError::WriteFailed {
                        path: path.to_string(),
                        source: e,
                    })
                }
            }
        }

        self.fs
            .write_file(path, data)
            .await
            .map_err(|source| FsError::WriteFailed {
                path: path.to_string(),
                source,
            })?;
        debug!(path, bytes = data.len(), "Staged engine file");
        Ok(())
    }

    /// Reads the file at `path`.
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError> {
        self.fs
            .read_file(path)
            .await
            .map_err(|source| FsError::ReadFailed {
                path: path.to_string(),
                source,
            })
    }

    /// Removes the file at `path`. Failures are logged and otherwise ignored.
    pub async fn delete_file(&self, path: &str) {
        if let Err(source) = self.fs.unlink(path).await {
            let err = FsError::DeleteFailed {
                path: path.to_string(),
                source,
            };
            if err.is_not_found() {
                debug!(path, "Engine file already absent");
            } else {
                warn!(error = %err, "Error deleting engine file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryFs;

    fn bridge() -> (FsBridge, Arc<MemoryFs>) {
        let fs = Arc::new(MemoryFs::new());
        (FsBridge::new(fs.clone()), fs)
    }

    #[tokio::test]
    async fn test_write_creates_intermediate_directories() {
        let (bridge, fs) = bridge();
        bridge.write_file("a/b/c/file", b"payload").await.unwrap();

        assert!(fs.is_dir("a"));
        assert!(fs.is_dir("a/b"));
        assert!(fs.is_dir("a/b/c"));
        assert_eq!(bridge.read_file("a/b/c/file").await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_write_absolute_path() {
        let (bridge, fs) = bridge();
        bridge.write_file("/work/in/input.wav", b"RIFF").await.unwrap();
        assert!(fs.is_dir("/work/in"));
        assert!(fs.contains("/work/in/input.wav"));
    }

    #[tokio::test]
    async fn test_write_ignores_existing_directories() {
        let (bridge, _fs) = bridge();
        bridge.write_file("a/b/first", b"1").await.unwrap();
        bridge.write_file("a/b/second", b"2").await.unwrap();
        bridge.write_file("a/b/first", b"3").await.unwrap();
        assert_eq!(bridge.read_file("a/b/first").await.unwrap(), b"3");
    }

    #[tokio::test]
    async fn test_write_through_file_component_fails() {
        let (bridge, _fs) = bridge();
        bridge.write_file("a", b"file").await.unwrap();
        let err = bridge.write_file("a/b", b"x").await.unwrap_err();
        assert!(matches!(err, FsError::WriteFailed { .. }));
        assert_eq!(err.path(), "a/b");
    }

    #[tokio::test]
    async fn test_write_rejects_directory_path() {
        let (bridge, _fs) = bridge();
        let err = bridge.write_file("a/b/", b"x").await.unwrap_err();
        assert!(matches!(err, FsError::InvalidPath { .. }));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let (bridge, _fs) = bridge();
        let err = bridge.read_file("output.mp3").await.unwrap_err();
        assert!(matches!(err, FsError::ReadFailed { .. }));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_best_effort() {
        let (bridge, fs) = bridge();
        bridge.write_file("input.wav", b"x").await.unwrap();
        bridge.delete_file("input.wav").await;
        assert!(!fs.contains("input.wav"));

        // Deleting a missing file does not panic or error.
        bridge.delete_file("input.wav").await;
    }
}
