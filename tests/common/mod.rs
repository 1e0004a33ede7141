//! Offline stand-ins for the remote feeds, shared by the integration tests.

#![allow(dead_code)]

use stackbox::error::{Error, Result};
use stackbox::sources::{
    ReleaseAsset, ReleaseSource, RuntimeIndex, RuntimeRelease, Sources, TagSource,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const NODE_DIST: &str = "https://nodejs.example/dist";

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[derive(Default)]
pub struct FakeTags {
    tags: HashMap<String, Vec<String>>,
}

impl FakeTags {
    pub fn with(mut self, stack: &str, tags: &[&str]) -> Self {
        self.tags.insert(
            stack.to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
        );
        self
    }
}

impl TagSource for FakeTags {
    fn fetch_tags(&self, stack: &str) -> Result<Vec<String>> {
        Ok(self.tags.get(stack).cloned().unwrap_or_default())
    }
}

/// Release feed that remembers which repositories were looked up.
#[derive(Default)]
pub struct FakeReleases {
    assets: HashMap<String, Vec<ReleaseAsset>>,
    calls: Mutex<Vec<String>>,
}

impl FakeReleases {
    pub fn with(mut self, repo: &str, names: &[&str]) -> Self {
        let assets = names
            .iter()
            .map(|name| {
                ReleaseAsset::new(
                    *name,
                    format!("https://github.com/{}/releases/download/v1/{}", repo, name),
                )
            })
            .collect();
        self.assets.insert(repo.to_string(), assets);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ReleaseSource for FakeReleases {
    fn latest_release(&self, owner: &str, name: &str) -> Result<Vec<ReleaseAsset>> {
        let repo = format!("{}/{}", owner, name);
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(repo.clone());
        self.assets.get(&repo).cloned().ok_or(Error::Http {
            url: format!("https://api.github.com/repos/{}/releases/latest", repo),
            status: 404,
        })
    }
}

pub struct FakeRuntimes {
    releases: Vec<RuntimeRelease>,
}

impl FakeRuntimes {
    pub fn new(releases: &[(&str, bool)]) -> Self {
        Self {
            releases: releases
                .iter()
                .map(|(version, lts)| RuntimeRelease {
                    version: version.to_string(),
                    lts: *lts,
                })
                .collect(),
        }
    }
}

impl Default for FakeRuntimes {
    fn default() -> Self {
        Self::new(&[("v21.6.1", false), ("v20.11.0", true), ("v18.19.0", true)])
    }
}

impl RuntimeIndex for FakeRuntimes {
    fn fetch_version_index(&self) -> Result<Vec<RuntimeRelease>> {
        Ok(self.releases.clone())
    }

    fn archive_url(&self, version: &str) -> String {
        format!("{}/{}/node-{}-linux-x64.tar.gz", NODE_DIST, version, version)
    }
}

/// Tags for every stack the fixtures use.
pub fn default_tags() -> FakeTags {
    FakeTags::default()
        .with("node", &["21.6.1", "20.11.0", "20.11.0-alpine", "18.19.0", "latest"])
        .with("python", &["3.12.1", "3.11.7", "3.11.7-slim", "3.10.13", "2.7.18"])
        .with("ruby", &["3.3.0", "3.2.2", "3.2.2-slim", "3.2.1"])
        .with(
            "php",
            &["8.3.1-apache", "8.2.14-apache", "8.2.14-fpm", "8.1.27-apache", "8.2.14"],
        )
        .with("golang", &["1.22.0", "1.21.6", "1.22.0-alpine"])
}

pub fn sources(tags: FakeTags, releases: Arc<FakeReleases>, runtimes: FakeRuntimes) -> Sources {
    Sources::new(Arc::new(tags), releases, Arc::new(runtimes))
}
