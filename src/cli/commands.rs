use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Detects the stack of a source tree and generates a pinned Dockerfile for it
#[derive(Parser, Debug)]
#[command(
    name = "stackbox",
    about = "Detects the stack of a source tree and generates a pinned Dockerfile for it",
    version,
    long_about = "stackbox inspects a project directory, recognises Go, PHP, Python, Ruby \
                  and Node.js projects, resolves the newest base image tag satisfying the \
                  declared runtime version and the build tools the project needs, and \
                  renders the result as a Dockerfile."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Print the Dockerfile of one or more projects",
        long_about = "Resolves every given project and prints its Dockerfile. Several \
                      projects are resolved concurrently.\n\n\
                      Examples:\n  \
                      stackbox dockerfile .\n  \
                      stackbox dockerfile services/api services/web"
    )]
    Dockerfile(DockerfileArgs),

    #[command(
        about = "Print the resolved recipe of a project",
        long_about = "Resolves a project and prints the recipe the Dockerfile is generated \
                      from.\n\n\
                      Examples:\n  \
                      stackbox detect\n  \
                      stackbox detect /path/to/repo --format yaml"
    )]
    Detect(DetectArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DockerfileArgs {
    #[arg(value_name = "PATH", required = true, help = "Project directories")]
    pub paths: Vec<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(
        value_name = "PATH",
        help = "Project directory (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "json",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
        }
    }
}
