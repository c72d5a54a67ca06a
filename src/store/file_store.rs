use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, warn};

use crate::store::record::TokenRecord;

/// File-backed store for the single live token record.
///
/// Writes land in a sibling `.tmp` path first and are renamed over the final
/// path, so concurrent readers (the publication endpoint included) only ever
/// see the previous complete record or the new complete record. The refresh
/// scheduler is the sole writer, so no locking is involved.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the record lives in; this is what the publication endpoint
    /// serves.
    pub fn dir(&self) -> PathBuf {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// The latest persisted record, or `None` when there is no usable one.
    ///
    /// An absent, unreadable or unparseable file, and a record without a
    /// non-empty `refresh_token`, all resolve to `None` so the caller falls
    /// back to the seed credential. None of these surface as errors.
    pub async fn read(&self) -> Option<TokenRecord> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) => {
                debug!("token file '{}' not readable: {}", self.path.display(), err);
                return None;
            }
        };
        let record: TokenRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                warn!("token file '{}' failed to parse: {}", self.path.display(), err);
                return None;
            }
        };
        if record.refresh_token().is_none() {
            warn!("token file '{}' carries no refresh_token", self.path.display());
            return None;
        }
        Some(record)
    }

    /// Persists a record, pretty-printed.
    pub async fn write(&self, record: &TokenRecord) -> Result<()> {
        let body = record.to_pretty_json()?;
        self.write_bytes(&body).await
    }

    /// Atomic replace: write a temp file in the same directory, restrict its
    /// permissions, then rename it over the final path.
    pub async fn write_bytes(&self, body: &[u8]) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .await
                .with_context(|| format!("restricting {}", tmp.display()))?;
        }
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}
