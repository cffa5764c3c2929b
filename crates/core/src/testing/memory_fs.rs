//! In-memory engine namespace for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::engine::EngineFs;

#[derive(Debug, Default)]
struct MemoryFsState {
    dirs: HashSet<String>,
    files: HashMap<String, Vec<u8>>,
}

impl MemoryFsState {
    fn is_dir(&self, normalized: &str) -> bool {
        normalized.is_empty() || self.dirs.contains(normalized)
    }
}

/// An in-memory [`EngineFs`] with the same strictness as a real namespace.
///
/// `mkdir` fails on existing paths and missing parents, and writes fail when
/// the parent directory does not exist. `/a/b` and `a/b` name the same entry.
#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<MemoryFsState>,
}

fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn parent(normalized: &str) -> &str {
    normalized
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .unwrap_or("")
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{}: No such file or directory", path))
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryFsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a file exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.state().files.contains_key(&normalize(path))
    }

    /// Whether a directory exists at `path`.
    pub fn is_dir(&self, path: &str) -> bool {
        self.state().is_dir(&normalize(path))
    }

    /// All file paths, sorted.
    pub fn file_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state().files.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Stores a file, creating its parent directories. Used to simulate the
    /// engine writing its own output.
    pub fn insert_file(&self, path: &str, data: Vec<u8>) {
        let normalized = normalize(path);
        let mut state = self.state();
        let mut dir = parent(&normalized).to_string();
        while !dir.is_empty() {
            state.dirs.insert(dir.clone());
            dir = parent(&dir).to_string();
        }
        state.files.insert(normalized, data);
    }
}

#[async_trait]
impl EngineFs for MemoryFs {
    async fn mkdir(&self, path: &str) -> io::Result<()> {
        let normalized = normalize(path);
        let mut state = self.state();
        if state.is_dir(&normalized) || state.files.contains_key(&normalized) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: File exists", path),
            ));
        }
        if !state.is_dir(parent(&normalized)) {
            return Err(not_found(path));
        }
        state.dirs.insert(normalized);
        Ok(())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> io::Result<()> {
        let normalized = normalize(path);
        let mut state = self.state();
        if state.is_dir(&normalized) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{}: Is a directory", path),
            ));
        }
        if !state.is_dir(parent(&normalized)) {
            return Err(not_found(path));
        }
        state.files.insert(normalized, data.to_vec());
        Ok(())
    }

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        self.state()
            .files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    async fn unlink(&self, path: &str) -> io::Result<()> {
        self.state()
            .files
            .remove(&normalize(path))
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }
}
