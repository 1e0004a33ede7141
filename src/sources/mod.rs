//! Remote metadata feeds consulted during resolution.
//!
//! Each feed sits behind a trait so resolution can run against fixtures; the
//! `remote` implementations talk to Docker Hub, GitHub and nodejs.org through
//! the shared [`HttpClient`].

mod github;
mod nodejs;
mod registry;

pub use github::GitHubReleases;
pub use nodejs::NodeDistIndex;
pub use registry::DockerRegistry;

use crate::config::StackboxConfig;
use crate::error::Result;
use crate::http::HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_url: String,
}

impl ReleaseAsset {
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
        }
    }
}

/// One entry of a runtime's published version index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeRelease {
    pub version: String,
    pub lts: bool,
}

/// Base image tags published for a stack.
#[cfg_attr(test, mockall::automock)]
pub trait TagSource: Send + Sync {
    fn fetch_tags(&self, stack: &str) -> Result<Vec<String>>;
}

/// Assets of the latest release of `owner/name`.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseSource: Send + Sync {
    fn latest_release(&self, owner: &str, name: &str) -> Result<Vec<ReleaseAsset>>;
}

/// Version index of a runtime distributed outside of release feeds (Node.js).
#[cfg_attr(test, mockall::automock)]
pub trait RuntimeIndex: Send + Sync {
    /// Releases, newest first.
    fn fetch_version_index(&self) -> Result<Vec<RuntimeRelease>>;

    /// Linux x64 tarball of `version`.
    fn archive_url(&self, version: &str) -> String;
}

/// The feeds a pipeline resolves against.
#[derive(Clone)]
pub struct Sources {
    pub tags: Arc<dyn TagSource>,
    pub releases: Arc<dyn ReleaseSource>,
    pub runtimes: Arc<dyn RuntimeIndex>,
}

impl Sources {
    pub fn new(
        tags: Arc<dyn TagSource>,
        releases: Arc<dyn ReleaseSource>,
        runtimes: Arc<dyn RuntimeIndex>,
    ) -> Self {
        Self {
            tags,
            releases,
            runtimes,
        }
    }

    pub fn remote(client: Arc<HttpClient>, config: &StackboxConfig) -> Self {
        Self {
            tags: Arc::new(DockerRegistry::new(
                client.clone(),
                &config.registry_url,
                &config.registry_auth_url,
            )),
            releases: Arc::new(GitHubReleases::new(
                client.clone(),
                &config.github_api_url,
                config.github_token.clone(),
            )),
            runtimes: Arc::new(NodeDistIndex::new(client, &config.node_dist_url)),
        }
    }
}
