// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CLI subcommands and shared plumbing.

pub mod inspect;
pub mod run;

use std::path::Path;
use streaming_model::{ProjectedConfig, ShellConfig};

/// Initialises tracing based on the `-v` count.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads the configuration file, or falls back to a small demo setup.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ProjectedConfig> {
    match path {
        Some(path) => {
            tracing::debug!("loading configuration from '{}'", path.display());
            Ok(ProjectedConfig::from_file(path)?)
        }
        None => {
            tracing::debug!("no config file given; using the built-in demo configuration");
            Ok(demo_config())
        }
    }
}

/// A compact configuration suitable for demonstrating the pipeline
/// without model files: identity units, one matched-width head and one
/// projected head.
fn demo_config() -> ProjectedConfig {
    ProjectedConfig {
        input_width: 32,
        output_widths: vec![32, 16],
        layout: "sequence-first".to_string(),
        bias: true,
        shell: ShellConfig {
            model_width: 32,
            head_count: 4,
            layer_count: 4,
            feed_forward_widths: vec![128],
            causal: true,
            context_window: Some(250),
            positional_embedding: "sin".to_string(),
            ..Default::default()
        },
    }
}
