use super::{RuntimeIndex, RuntimeRelease};
use crate::error::Result;
use crate::http::HttpClient;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct IndexEntry {
    version: String,
    /// `false` for current releases, the codename (e.g. `"Iron"`) for LTS lines.
    #[serde(default)]
    lts: Value,
}

impl From<IndexEntry> for RuntimeRelease {
    fn from(entry: IndexEntry) -> Self {
        let lts = !matches!(entry.lts, Value::Bool(false) | Value::Null);
        RuntimeRelease {
            version: entry.version,
            lts,
        }
    }
}

/// The `index.json` published on a Node.js distribution mirror.
pub struct NodeDistIndex {
    client: Arc<HttpClient>,
    dist_url: String,
}

impl NodeDistIndex {
    pub fn new(client: Arc<HttpClient>, dist_url: &str) -> Self {
        Self {
            client,
            dist_url: dist_url.trim_end_matches('/').to_string(),
        }
    }
}

impl RuntimeIndex for NodeDistIndex {
    fn fetch_version_index(&self) -> Result<Vec<RuntimeRelease>> {
        let url = format!("{}/index.json", self.dist_url);
        let entries: Vec<IndexEntry> = self.client.get_json(&url, None)?;
        Ok(entries.into_iter().map(RuntimeRelease::from).collect())
    }

    fn archive_url(&self, version: &str) -> String {
        format!(
            "{}/{}/node-{}-linux-x64.tar.gz",
            self.dist_url, version, version
        )
    }
}
