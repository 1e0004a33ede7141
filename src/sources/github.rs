use super::{ReleaseAsset, ReleaseSource};
use crate::error::Result;
use crate::http::HttpClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    tag_name: String,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
}

/// Latest-release lookups against the GitHub REST API.
pub struct GitHubReleases {
    client: Arc<HttpClient>,
    api_url: String,
    token: Option<String>,
}

impl GitHubReleases {
    pub fn new(client: Arc<HttpClient>, api_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn latest_url(&self, owner: &str, name: &str) -> String {
        format!("{}/repos/{}/{}/releases/latest", self.api_url, owner, name)
    }
}

impl ReleaseSource for GitHubReleases {
    fn latest_release(&self, owner: &str, name: &str) -> Result<Vec<ReleaseAsset>> {
        let url = self.latest_url(owner, name);
        let release: Release = self.client.get_json(&url, self.token.as_deref())?;
        debug!(
            "Latest {}/{} release {} has {} assets",
            owner,
            name,
            release.tag_name,
            release.assets.len()
        );

        Ok(release
            .assets
            .into_iter()
            .map(|a| ReleaseAsset::new(a.name, a.browser_download_url))
            .collect())
    }
}
