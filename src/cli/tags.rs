// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 relflow contributors

//! Tags command - show what docker-publish would push

use colored::Colorize;
use miette::Result;
use serde::Serialize;

use super::{GlobalArgs, OutputFormat};
use crate::artifacts::Artifact;
use crate::pipeline::{ManifestGroup, ReleaseConfig, TaskRegistry};
use crate::tags::{self, DerivedTags};

#[derive(Serialize)]
struct TagsOutput<'a> {
    registry: &'a str,
    artifacts: Vec<DerivedTags>,
    manifests: Vec<&'a ManifestGroup>,
}

fn render_json(output: &TagsOutput<'_>) -> crate::RelflowResult<String> {
    Ok(serde_json::to_string_pretty(output)?)
}

/// Run the tags command. No artifact is read.
pub async fn run(
    globals: &GlobalArgs,
    artifacts: Vec<String>,
    registry: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let registry = match registry {
        Some(registry) => registry,
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
            ReleaseConfig::load(globals.config.as_deref(), &cwd)?.registry
        }
    };

    let derived = artifacts
        .iter()
        .map(|name| tags::derive(name.rsplit('/').next().unwrap_or(name), &registry))
        .collect::<crate::RelflowResult<Vec<_>>>()?;

    let handles: Vec<Artifact> = artifacts.iter().map(|name| Artifact::new(name.as_str(), name.as_str())).collect();
    let plan = TaskRegistry::derive(&handles, &registry)?;

    match format {
        OutputFormat::Json => {
            let output = TagsOutput {
                registry: &registry,
                artifacts: derived,
                manifests: plan.manifests().iter().collect(),
            };
            let json = render_json(&output)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for artifact in &derived {
                println!("{} ({})", artifact.artifact.bold(), artifact.base.as_str());
                for (tag, _) in &artifact.tags {
                    println!("  {}", tag);
                }
            }

            println!();
            println!("{}:", "Manifests".bold());
            for group in plan.manifests().iter() {
                println!("  {}", group.manifest.as_str().cyan());
                for tag in &group.tags {
                    println!("    {} {}", "←".dimmed(), tag);
                }
            }
        }
    }

    Ok(())
}
