use std::collections::HashSet;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::StateError;
use crate::lock::WriteLock;

/// State file used when none is configured
pub const DEFAULT_STATE_FILE: &str = "processed_fingerprints.txt";

/// Identifiers already processed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedSet {
    ids: HashSet<String>,
}

impl ProcessedSet {
    /// Parse the state file format, ignoring blank lines
    pub fn parse(text: &str) -> Self {
        Self {
            ids: text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Whether `id` has been processed
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of distinct identifiers
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing has been processed
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Append-only store of processed identifiers
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    lock: WriteLock,
}

impl StateStore {
    /// Store at `path`, serialized through `lock`
    pub fn new(path: impl Into<PathBuf>, lock: WriteLock) -> Self {
        Self {
            path: path.into(),
            lock,
        }
    }

    /// State file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock guarding this store
    pub fn lock(&self) -> &WriteLock {
        &self.lock
    }

    /// Read the current set
    ///
    /// A missing file is an empty set. Read errors are logged and also yield an
    /// empty set.
    pub async fn load(&self) -> ProcessedSet {
        let _guard = self.lock.acquire().await;
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => {
                let set = ProcessedSet::parse(&text);
                debug!(path = %self.path.display(), count = set.len(), "loaded processed set");
                set
            }
            Err(e) if e.kind() == ErrorKind::NotFound => ProcessedSet::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read state file");
                ProcessedSet::default()
            }
        }
    }

    /// Append `id`, creating the file if needed
    ///
    /// A file whose last line lacks a terminator gets one first, so the previous
    /// identifier and `id` stay on separate lines.
    pub async fn save(&self, id: &str) -> Result<(), StateError> {
        let id = id.trim();
        if id.is_empty() || id.contains(['\n', '\r']) {
            return Err(StateError::InvalidIdentifier(id.to_string()));
        }
        let io_error = |source| StateError::Io {
            path: self.path.clone(),
            source,
        };

        let _guard = self.lock.acquire().await;
        let mut file = tokio::fs::OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_error)?;
        let len = file.metadata().await.map_err(io_error)?.len();
        let mut record = String::with_capacity(id.len().saturating_add(2));
        if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1)).await.map_err(io_error)?;
            file.read_exact(&mut last).await.map_err(io_error)?;
            if last != [b'\n'] {
                record.push('\n');
            }
        }
        record.push_str(id);
        record.push('\n');
        file.write_all(record.as_bytes())
            .await
            .map_err(io_error)?;
        file.flush().await.map_err(io_error)?;
        debug!(path = %self.path.display(), %id, "appended processed identifier");
        Ok(())
    }
}
