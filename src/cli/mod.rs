// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for relflow.

pub mod docker_publish;
pub mod publish;
pub mod session;
pub mod tags;
pub mod validate;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Release publication orchestrator
///
/// Publish release artifacts as images, manifests and files under a
/// shared concurrency budget.
#[derive(Parser, Debug)]
#[clap(
    name = "relflow",
    version,
    about = "Publish release artifacts as images, manifests and files with bounded concurrency",
    long_about = None,
    after_help = "Examples:\n\
        relflow tags grafana_9.5.0_1_linux_amd64.tar.gz        Show derived tags\n\
        relflow docker-publish -p 'dist/*.docker.tar.gz'       Push images and manifests\n\
        relflow publish -p 'dist/*.deb' -d gs://bucket/main    Copy packages\n\
        relflow validate -p 'dist/*.rpm'                       Run validation workloads\n\n\
        See 'relflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    #[clap(flatten)]
    pub globals: GlobalArgs,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Config file (default: .relflow.yaml, .relflow.yml or .relflow.toml)
    #[clap(long, global = true, env = "RELFLOW_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum number of actions in flight
    #[clap(short = 'j', long, global = true, env = "RELFLOW_PARALLEL", value_name = "N")]
    pub parallel: Option<usize>,

    /// Directory package names are resolved against
    #[clap(long, global = true, env = "RELFLOW_ARTIFACTS_DIR", value_name = "DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Shell used to run commands
    #[clap(long, global = true, env = "RELFLOW_SHELL")]
    pub shell: Option<String>,

    /// Show a progress bar instead of per-task log lines
    #[clap(long, global = true)]
    pub progress: bool,

    /// Give up on tasks still waiting for a concurrency unit after this many seconds
    #[clap(long, global = true, env = "RELFLOW_TIMEOUT", value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and push one image per tag, then one manifest list per release
    DockerPublish {
        /// Package names or glob patterns
        #[clap(short, long = "package", required = true)]
        packages: Vec<String>,

        /// Registry prefix for image tags
        #[clap(short, long, env = "RELFLOW_REGISTRY")]
        registry: Option<String>,
    },

    /// Copy packages to a destination prefix
    Publish {
        /// Package names or glob patterns
        #[clap(short, long = "package", required = true)]
        packages: Vec<String>,

        /// Destination prefix (local path, file:// or remote URL)
        #[clap(short, long, env = "RELFLOW_DESTINATION")]
        destination: Option<String>,
    },

    /// Run the validation command against each package
    Validate {
        /// Package names or glob patterns
        #[clap(short, long = "package", required = true)]
        packages: Vec<String>,
    },

    /// Show the tags and manifest lists derived from artifact names
    Tags {
        /// Artifact file names
        #[clap(required = true)]
        artifacts: Vec<String>,

        /// Registry prefix for image tags
        #[clap(short, long, env = "RELFLOW_REGISTRY")]
        registry: Option<String>,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Output format for the tags command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
