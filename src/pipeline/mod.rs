//! Metadata resolution: detection, path discovery, version pinning and tool
//! resolution, run as ordered phases over a shared [`ResolutionContext`].

pub mod context;
pub mod orchestrator;
pub mod phase_trait;
pub mod phases;

pub use context::ResolutionContext;
pub use orchestrator::RecipePipeline;
pub use phase_trait::ResolutionPhase;
