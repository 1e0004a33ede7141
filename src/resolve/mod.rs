//! Resolvers that turn declared intent into pinned, concrete values.

pub mod copy;
pub mod download;
pub mod version;

pub use download::DownloadResolver;
pub use version::VersionResolver;
