// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Publish command - copy packages to a destination

use colored::Colorize;
use miette::Result;
use std::sync::Arc;

use super::session::Session;
use super::GlobalArgs;
use crate::errors::RelflowError;
use crate::executors::{is_local_destination, LocalFilePublisher};
use crate::pipeline::ConfigOverrides;

/// Run the publish command
pub async fn run(globals: &GlobalArgs, packages: Vec<String>, destination: Option<String>) -> Result<()> {
    let session = Session::open(
        globals,
        ConfigOverrides {
            destination,
            ..ConfigOverrides::default()
        },
    )?;

    let destination = session
        .config
        .destination
        .clone()
        .ok_or_else(|| RelflowError::InvalidConfig {
            reason: "no destination given".to_string(),
            help: Some("Pass --destination or set 'destination' in .relflow.yaml".to_string()),
        })?;

    let packages = session.packages(&packages)?;

    // Local copies need no shell
    let actions = session.config.shell_actions(&session.working_dir);
    if !is_local_destination(&destination) {
        actions.check_available()?;
    }
    let publisher = Arc::new(LocalFilePublisher::new(actions));

    println!(
        "{} {} package(s) to {}",
        "Publishing".bold(),
        packages.len(),
        destination.cyan()
    );

    let mut orchestrator = session.orchestrator()?;
    let outcome = orchestrator
        .publish_files(&session.source(), &packages, &destination, publisher)
        .await;
    let report = session.finish(outcome)?;

    for output in report.outputs() {
        println!("  {} {}", "✓".green(), output);
    }

    Ok(())
}
