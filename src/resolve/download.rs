use crate::error::{Error, Result};
use crate::recipe::{Artifact, Tool};
use crate::sources::{ReleaseAsset, ReleaseSource, RuntimeIndex};
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Tool resolved through the runtime index instead of release assets.
const NODE_TOOL: &str = "node";

/// Matches Linux amd64 binaries or tarballs, and PHP archives.
pub fn asset_pattern(tool: &str) -> Result<Regex> {
    Regex::new(&format!(
        r"{}(.*linux[-_]amd64($|\.tar\.gz)|\.phar)",
        regex::escape(tool)
    ))
    .map_err(|_| Error::ToolNotFound {
        tool: tool.to_string(),
    })
}

/// Picks the artifact kind from the download file name.
pub fn classify(url: &str, extract_to: Option<String>) -> Artifact {
    if url.ends_with(".tar.gz") {
        Artifact::Archive {
            url: url.to_string(),
            extract_to,
        }
    } else {
        Artifact::RawBinary {
            url: url.to_string(),
        }
    }
}

/// Finds the install artifact of tools published by an owner.
#[derive(Clone)]
pub struct DownloadResolver {
    releases: Arc<dyn ReleaseSource>,
    runtimes: Arc<dyn RuntimeIndex>,
}

impl DownloadResolver {
    pub fn new(releases: Arc<dyn ReleaseSource>, runtimes: Arc<dyn RuntimeIndex>) -> Self {
        Self { releases, runtimes }
    }

    /// Fills in the tool's artifact. Tools without an owner keep the artifact
    /// they declared.
    pub fn resolve(&self, tool: &mut Tool) -> Result<()> {
        if !tool.needs_download() {
            return Ok(());
        }

        let artifact = if tool.name == NODE_TOOL {
            self.resolve_runtime(tool)
        } else {
            self.resolve_release(tool)
        }
        .map_err(|e| e.for_tool(&tool.name))?;

        debug!(
            "Tool {} downloads from {}",
            tool.name,
            artifact.download_url().unwrap_or_default()
        );
        tool.artifact = artifact;
        Ok(())
    }

    fn resolve_runtime(&self, tool: &Tool) -> Result<Artifact> {
        let release = self
            .runtimes
            .fetch_version_index()?
            .into_iter()
            .find(|r| r.lts)
            .ok_or_else(|| Error::ToolNotFound {
                tool: tool.name.clone(),
            })?;

        Ok(Artifact::Archive {
            url: self.runtimes.archive_url(&release.version),
            extract_to: tool.extract_to.clone(),
        })
    }

    fn resolve_release(&self, tool: &Tool) -> Result<Artifact> {
        let assets = self.releases.latest_release(&tool.owner, &tool.name)?;
        let pattern = asset_pattern(&tool.name)?;

        let asset: &ReleaseAsset = assets
            .iter()
            .find(|a| pattern.is_match(&a.name))
            .ok_or_else(|| Error::ToolNotFound {
                tool: tool.name.clone(),
            })?;

        Ok(classify(&asset.download_url, tool.extract_to.clone()))
    }
}
