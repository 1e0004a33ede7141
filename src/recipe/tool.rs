use serde::Serialize;
use std::collections::BTreeMap;

/// Destination directory (relative, `""` for the project root) to the files
/// copied there before a tool runs.
pub type CopyPlan = BTreeMap<String, Vec<String>>;

/// How a tool gets into the image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    /// Already present in the base image, or installed by the package manager.
    #[default]
    None,
    /// A single executable placed into `/usr/local/bin`.
    RawBinary { url: String },
    /// A gzipped tarball unpacked with its leading path component stripped.
    Archive {
        url: String,
        extract_to: Option<String>,
    },
    /// A bootstrap one-liner run verbatim.
    ShellCommand { command: String },
}

impl Artifact {
    pub fn download_url(&self) -> Option<&str> {
        match self {
            Artifact::RawBinary { url } | Artifact::Archive { url, .. } => Some(url),
            Artifact::None | Artifact::ShellCommand { .. } => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Artifact::None)
    }
}

/// Stack-specific adjustments applied to a tool once the base image version is
/// known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Switch `npm install` to `npm ci` when a lockfile exists and the resolved
    /// Node release ships an npm that understands it.
    NpmCleanInstall,
}

/// One external program or package manager invoked during the build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tool {
    pub name: String,
    /// Release owner; empty when nothing has to be downloaded.
    pub owner: String,
    /// Patterns of the project files the install step depends on.
    pub files: Vec<String>,
    pub copy: CopyPlan,
    pub install: Vec<String>,
    pub artifact: Artifact,
    /// Overrides `/usr/local/bin` as the extraction root of archives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook: Option<HookKind>,
}

impl Tool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The unnamed tool that copies the whole project and runs the stack's own
    /// install steps.
    pub fn project(install: Vec<String>) -> Self {
        Self {
            files: vec![".".to_string()],
            install,
            ..Self::default()
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_install<I, S>(mut self, install: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.install = install.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_shell(mut self, command: impl Into<String>) -> Self {
        self.artifact = Artifact::ShellCommand {
            command: command.into(),
        };
        self
    }

    pub fn with_extract_to(mut self, dir: impl Into<String>) -> Self {
        self.extract_to = Some(dir.into());
        self
    }

    pub fn with_hook(mut self, hook: HookKind) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn needs_download(&self) -> bool {
        !self.owner.is_empty()
    }

    /// Nothing to copy and nothing to run, so the tool emits no instructions.
    pub fn is_idle(&self) -> bool {
        self.copy.is_empty() && self.install.is_empty()
    }
}
