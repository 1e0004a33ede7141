//! Recipe code generation.

mod dockerfile;

pub use dockerfile::DockerfileGenerator;
