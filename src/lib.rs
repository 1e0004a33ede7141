//! stackbox - detect a project's stack and containerize it
//!
//! This library inspects a source tree, works out which language stack it
//! belongs to and resolves a fully pinned build recipe for it: base image tag,
//! system packages, build tools with their download locations, install steps,
//! environment and start command. The recipe is then rendered as a Dockerfile.
//!
//! # Core Concepts
//!
//! - **Stack**: a family of projects sharing a base image and toolchain
//!   (Go, PHP, Python, Ruby, Node.js). Stacks are tried in a fixed order and
//!   the first one claiming the project wins.
//! - **Recipe**: the resolved description of how to build the project.
//! - **Sources**: remote feeds consulted during resolution (registry tags,
//!   GitHub releases, the Node.js version index), cached on disk.
//!
//! # Example Usage
//!
//! ```no_run
//! use stackbox::{DockerfileGenerator, RecipePipeline, StackboxConfig};
//!
//! fn dockerfile(path: &str) -> stackbox::Result<String> {
//!     let pipeline = RecipePipeline::from_config(&StackboxConfig::default())?;
//!     let recipe = pipeline.resolve(path)?;
//!     Ok(DockerfileGenerator::new(&recipe).render())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`stack`]: stack detectors
//! - [`pipeline`]: the ordered resolution phases
//! - [`resolve`]: version, download and file copy resolution
//! - [`render`]: Dockerfile generation

pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod http;
pub mod pipeline;
pub mod recipe;
pub mod render;
pub mod resolve;
pub mod sources;
pub mod stack;
pub mod util;

pub use config::{ConfigError, StackboxConfig};
pub use error::{Error, Result};
pub use pipeline::RecipePipeline;
pub use recipe::{Recipe, Tool};
pub use render::DockerfileGenerator;
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
