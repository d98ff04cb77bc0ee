// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! relflow - Release Publication Orchestrator
//!
//! Publish release artifacts as images, manifests and files with bounded concurrency.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relflow::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let globals = &cli.globals;

    // Initialize tracing
    let default_filter = if globals.verbose { "relflow=debug" } else { "relflow=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Change to specified directory if provided
    if let Some(ref dir) = globals.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::DockerPublish { packages, registry } => {
            relflow::cli::docker_publish::run(globals, packages, registry).await
        }
        Commands::Publish {
            packages,
            destination,
        } => relflow::cli::publish::run(globals, packages, destination).await,
        Commands::Validate { packages } => relflow::cli::validate::run(globals, packages).await,
        Commands::Tags {
            artifacts,
            registry,
            format,
        } => relflow::cli::tags::run(globals, artifacts, registry, format).await,
    }
}
