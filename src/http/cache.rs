//! On-disk response cache keyed by request URL.
//!
//! Entries live one file per URL (SHA-256 of the URL) and are replaced by
//! renaming a uniquely named temporary file, so concurrent resolutions sharing
//! a cache directory never read a half-written entry.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    pub etag: Option<String>,
    /// Raw `Link` header of the response, kept for paginated feeds.
    #[serde(default)]
    pub link: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub body: String,
}

impl CacheEntry {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        let ttl = ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::MAX);
        Utc::now().signed_duration_since(self.fetched_at) < ttl
    }
}

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Stored entry for `url`, fresh or not. Unreadable entries count as misses.
    pub fn load(&self, url: &str) -> Option<CacheEntry> {
        let path = self.entry_path(url);
        let content = fs::read_to_string(&path).ok()?;

        match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) if entry.url == url => Some(entry),
            Ok(_) => None,
            Err(e) => {
                debug!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn store(
        &self,
        url: &str,
        etag: Option<String>,
        link: Option<String>,
        body: String,
    ) -> Result<CacheEntry> {
        let entry = CacheEntry {
            url: url.to_string(),
            etag,
            link,
            fetched_at: Utc::now(),
            body,
        };
        self.write(&entry)?;
        Ok(entry)
    }

    /// Restarts the freshness window of a revalidated entry.
    pub fn refresh(&self, mut entry: CacheEntry) -> Result<CacheEntry> {
        entry.fetched_at = Utc::now();
        self.write(&entry)?;
        Ok(entry)
    }

    pub fn invalidate(&self, url: &str) -> Result<()> {
        let path = self.entry_path(url);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Cache { path, source }),
        }
    }

    fn write(&self, entry: &CacheEntry) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| Error::Cache {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.entry_path(&entry.url);
        let tmp = self
            .dir
            .join(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));

        let content = serde_json::to_string(entry).map_err(|e| Error::Cache {
            path: path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;

        fs::write(&tmp, content).map_err(|source| Error::Cache {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            Error::Cache {
                path: path.clone(),
                source,
            }
        })
    }
}
