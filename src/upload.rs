//! Object-store upload dispatch
//!
//! A [`Destination`] wraps an `object_store` backend (S3 or the local
//! filesystem, the latter doubling as the test double). The
//! [`UploadDispatcher`] walks the finalized run directory and ships every
//! regular file, retrying each transfer up to a configured attempt count;
//! a file that still fails is logged and skipped so the rest of the batch
//! survives. Remote keys mirror the path relative to the local output
//! root.

use crate::config::UploadConfig;
use crate::error::{Error, Result};
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Upload destination parsed from a URL
#[derive(Debug, Clone)]
pub struct Destination {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    scheme: String,
}

impl Destination {
    /// Parse a destination URL and create the matching object store.
    ///
    /// Supported formats:
    /// - `s3://bucket/prefix/` — Amazon S3 (credentials from the environment)
    /// - `/local/path/` or `./path/` — local filesystem
    pub fn parse(url: &str) -> Result<Self> {
        if url.starts_with("s3://") {
            Self::parse_s3(url)
        } else {
            Self::parse_local(url)
        }
    }

    fn parse_s3(url: &str) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("s3://")
            .ok_or_else(|| Error::config(format!("Invalid s3 URL: {url}")))?;

        let (bucket, prefix) = match without_scheme.find('/') {
            Some(idx) => (
                &without_scheme[..idx],
                without_scheme[idx + 1..].trim_end_matches('/').to_string(),
            ),
            None => (without_scheme, String::new()),
        };
        if bucket.is_empty() {
            return Err(Error::config(format!("Missing bucket name in: {url}")));
        }

        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create s3 client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "s3".to_string(),
        })
    }

    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            scheme: "file".to_string(),
        })
    }

    /// Check if this is a cloud destination (not local)
    pub fn is_cloud(&self) -> bool {
        self.scheme != "file"
    }

    /// Get the scheme (`s3` or `file`)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Cheap reachability probe so missing credentials or bucket fail
    /// fast, before any crawl work.
    pub async fn verify(&self) -> Result<()> {
        let probe = if self.prefix.is_empty() {
            None
        } else {
            Some(ObjectPath::from(self.prefix.as_str()))
        };
        self.store
            .list_with_delimiter(probe.as_ref())
            .await
            .map_err(|e| Error::config(format!("Destination unreachable: {e}")))?;
        Ok(())
    }

    fn full_key(&self, key: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(key)
        } else {
            ObjectPath::from(format!("{}/{key}", self.prefix))
        }
    }

    /// Put raw bytes under a key (one attempt, no retry)
    pub async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.full_key(key);
        self.store.put(&path, data.into()).await?;
        debug!("Uploaded {}://{path}", self.scheme);
        Ok(())
    }
}

/// Result of dispatching one run directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    /// Files uploaded successfully
    pub uploaded: usize,
    /// Files that failed every attempt and were skipped
    pub failed: usize,
}

/// Walks a finalized output tree and ships each file with retry
pub struct UploadDispatcher {
    destination: Destination,
    attempts: u32,
    retry_delay: Duration,
}

impl UploadDispatcher {
    /// Create a dispatcher over a destination with transfer tuning
    pub fn new(destination: Destination, config: &UploadConfig) -> Self {
        Self {
            destination,
            attempts: config.attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// The wrapped destination
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Upload one local file under a remote key, retrying transient
    /// failures with doubling delays.
    pub async fn upload_file(&self, local: &Path, key: &str) -> Result<()> {
        let data = Bytes::from(std::fs::read(local)?);

        let mut delay = self.retry_delay;
        let mut last = None;
        for attempt in 1..=self.attempts {
            match self.destination.put(key, data.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if attempt < self.attempts && e.is_retryable() {
                        warn!(
                            "Upload of {key} failed (attempt {attempt}/{}), retrying in {:?}: {e}",
                            self.attempts, delay
                        );
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                        last = Some(e);
                        continue;
                    }
                    return Err(Error::upload(key, attempt, e.to_string()));
                }
            }
        }
        Err(Error::upload(
            key,
            self.attempts,
            last.map_or_else(|| "unknown".to_string(), |e| e.to_string()),
        ))
    }

    /// Walk `root` recursively and upload every regular file.
    ///
    /// Keys are paths relative to `root`, prefixed with `key_base` when it
    /// is non-empty (the run timestamp, so one invocation never touches
    /// other runs' keys). A file that exhausts its attempts is logged and
    /// skipped; the batch always runs to the end.
    pub async fn upload_dir(&self, root: &Path, key_base: &str) -> Result<UploadStats> {
        let files = collect_files(root)?;
        let mut stats = UploadStats::default();

        for local in files {
            let key = match relative_key(root, &local) {
                Some(rel) if key_base.is_empty() => rel,
                Some(rel) => format!("{key_base}/{rel}"),
                None => {
                    warn!("Skipping non-relative path {}", local.display());
                    stats.failed += 1;
                    continue;
                }
            };
            match self.upload_file(&local, &key).await {
                Ok(()) => stats.uploaded += 1,
                Err(e) => {
                    error!("Giving up on {}: {e}", local.display());
                    stats.failed += 1;
                }
            }
        }

        info!(
            "Upload complete: {} file(s) sent, {} failed",
            stats.uploaded, stats.failed
        );
        Ok(stats)
    }
}

/// Collect every regular file under `root`, depth-first
fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Remote key for a local file: the path relative to the output root,
/// with forward slashes
fn relative_key(root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel.iter().map(|c| c.to_str()).collect::<Option<_>>()?;
    Some(parts.join("/"))
}
