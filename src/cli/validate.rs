// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Validate command - run the validation workload against packages

use colored::Colorize;
use miette::Result;
use std::sync::Arc;

use super::session::Session;
use super::GlobalArgs;
use crate::errors::RelflowError;
use crate::pipeline::ConfigOverrides;

/// Run the validate command
pub async fn run(globals: &GlobalArgs, packages: Vec<String>) -> Result<()> {
    let session = Session::open(globals, ConfigOverrides::default())?;

    if session.config.commands.validate.is_none() {
        return Err(RelflowError::InvalidConfig {
            reason: "no validate command configured".to_string(),
            help: Some("Set 'commands.validate' in .relflow.yaml".to_string()),
        }
        .into());
    }

    let packages = session.packages(&packages)?;
    let validator = Arc::new(session.actions()?);

    println!("{} {} package(s)", "Validating".bold(), packages.len());

    let mut orchestrator = session.orchestrator()?;
    let outcome = orchestrator
        .validate_packages(&session.source(), &packages, validator)
        .await;
    let report = session.finish(outcome)?;

    for task in report.phase_one.reports() {
        println!("  {} {}", "✓".green(), task.id);
        if globals.verbose && !task.output.is_empty() {
            println!("      {}", task.output.dimmed());
        }
    }

    Ok(())
}
