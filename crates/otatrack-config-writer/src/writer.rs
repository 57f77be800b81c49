use std::path::{Path, PathBuf};

use otatrack_device::DeviceIdentity;
use otatrack_state::WriteLock;
use tracing::{debug, info};

use crate::error::ConfigWriteError;
use crate::rewrite::{IncrementalEdit, rewrite_incremental};

/// Applies incremental rewrites to documents on disk
///
/// Writes go through the shared [`WriteLock`] so concurrent checks never interleave
/// read-modify-write cycles on the same file.
#[derive(Debug, Clone)]
pub struct ConfigWriter {
    lock: WriteLock,
}

impl ConfigWriter {
    /// Writer serialized through `lock`
    pub fn new(lock: WriteLock) -> Self {
        Self { lock }
    }

    /// Rewrite the incremental applying to `identity` in the document at `path`
    ///
    /// The file is replaced atomically through a sibling temporary file, and only
    /// when the text changes.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or written, or when the entry to
    /// edit cannot be located.
    pub async fn update_incremental(
        &self,
        path: &Path,
        identity: &DeviceIdentity,
        value: &str,
    ) -> Result<IncrementalEdit, ConfigWriteError> {
        let _guard = self.lock.acquire().await;

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| io_error(path, source))?;
        let (updated, edit) = rewrite_incremental(&text, identity, value)?;

        if !edit.changed() {
            debug!(path = %path.display(), value, "incremental already current");
            return Ok(edit);
        }

        let temp = temp_path(path);
        tokio::fs::write(&temp, updated.as_bytes())
            .await
            .map_err(|source| io_error(&temp, source))?;
        if let Err(source) = tokio::fs::rename(&temp, path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                debug!(path = %temp.display(), error = %cleanup, "temporary file left behind");
            }
            return Err(io_error(path, source));
        }

        info!(
            path = %path.display(),
            line = ?edit.line,
            operation = ?edit.operation,
            old = ?edit.old_value,
            new = %edit.new_value,
            "updated incremental"
        );
        Ok(edit)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> ConfigWriteError {
    ConfigWriteError::Io {
        path: path.to_path_buf(),
        source,
    }
}
