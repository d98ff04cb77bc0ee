// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Docker publish command - push images, then manifest lists

use colored::Colorize;
use miette::Result;
use std::sync::Arc;

use super::session::Session;
use super::GlobalArgs;
use crate::pipeline::ConfigOverrides;

/// Run the docker-publish command
pub async fn run(globals: &GlobalArgs, packages: Vec<String>, registry: Option<String>) -> Result<()> {
    let session = Session::open(
        globals,
        ConfigOverrides {
            registry,
            ..ConfigOverrides::default()
        },
    )?;

    let packages = session.packages(&packages)?;
    let actions = Arc::new(session.actions()?);

    println!(
        "{} {} package(s) to {}",
        "Publishing".bold(),
        packages.len(),
        session.config.registry.cyan()
    );

    let mut orchestrator = session.orchestrator()?;
    let outcome = orchestrator
        .publish_images(
            &session.source(),
            &packages,
            &session.config.registry,
            actions.clone(),
            actions,
        )
        .await;
    let report = session.finish(outcome)?;

    println!();
    println!("{}:", "Images".bold());
    for output in report.phase_one.outputs() {
        println!("  {} {}", "✓".green(), output);
    }

    println!();
    println!("{}:", "Manifests".bold());
    for group in report.manifests.iter() {
        println!("  {} {} ({} tags)", "✓".green(), group.manifest, group.tags.len());
        if globals.verbose {
            for tag in &group.tags {
                println!("      {}", tag.as_str().dimmed());
            }
        }
    }

    Ok(())
}
