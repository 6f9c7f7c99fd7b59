use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::HarvestError;

/// Append-only output file shared by every domain task.
///
/// Each domain's lines go out as one block while the lock is held, so blocks
/// from different domains never interleave.
pub struct UrlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl UrlSink {
    /// Remove any output left by a previous run and open a fresh file.
    pub async fn reset(path: &Path) -> Result<Self, HarvestError> {
        let reset_err = |source: std::io::Error| HarvestError::Reset {
            path: path.to_path_buf(),
            source,
        };

        match fs::remove_file(path).await {
            Ok(()) => info!(action = "remove", component = "url_sink", file_path = ?path, "Removed stale output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(reset_err(e)),
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(reset_err)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `lines`, one per line, as a single write.
    pub async fn append_block(&self, lines: &[String]) -> Result<(), HarvestError> {
        if lines.is_empty() {
            return Ok(());
        }

        let size = lines.iter().map(|line| line.len() + 1).sum();
        let mut block = String::with_capacity(size);
        for line in lines {
            block.push_str(line);
            block.push('\n');
        }

        let write_err = |source: std::io::Error| HarvestError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = self.file.lock().await;
        file.write_all(block.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;
        drop(file);

        debug!(action = "append", component = "url_sink", file_path = ?self.path, line_count = lines.len(), "Appended block");
        Ok(())
    }
}

/// The two outputs of a run: every URL, and the parameterized subset.
pub struct Sinks {
    pub all: UrlSink,
    pub params: UrlSink,
}

impl Sinks {
    pub async fn reset(all_path: &Path, params_path: &Path) -> Result<Self, HarvestError> {
        Ok(Self {
            all: UrlSink::reset(all_path).await?,
            params: UrlSink::reset(params_path).await?,
        })
    }
}
