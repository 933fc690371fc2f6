// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `streamformer inspect` command: print the resolved configuration,
//! unit stack, and derived projections.

use streaming_model::{unit_stack, ProjectedConfig, ProjectedTransformer};

pub fn execute(config: ProjectedConfig) -> anyhow::Result<()> {
    config.validate()?;

    let units = unit_stack("identity", config.shell.layer_count)?;
    let model = ProjectedTransformer::new(config, units)?;
    let config = model.config();
    let shell = model.shell().config();

    println!("streamformer · configuration");
    println!();
    println!("  Shell:");
    println!("   model_width:      {}", shell.model_width);
    println!("   head_count:       {}", shell.head_count);
    println!("   layer_count:      {}", shell.layer_count);
    println!("   feed_forward:     {:?}", shell.feed_forward_widths);
    println!("   causal:           {}", shell.causal);
    println!("   context_window:   {:?}", shell.context_window);
    println!("   positional:       {}", model.shell().positional());
    println!("   max_period:       {}", shell.max_period);
    println!("   positional_scale: {}", shell.positional_scale);
    println!();

    println!("  Unit stack:");
    for (i, unit) in model.shell().units().iter().enumerate() {
        println!("   [{i}] {}", unit.name());
    }
    println!();

    println!("  Projections (layout '{}'):", config.layout);
    match model.input_projection() {
        Some(proj) => println!(
            "   input:  linear {} -> {} ({} parameters)",
            proj.in_features(),
            proj.out_features(),
            parameter_count(proj.in_features(), proj.out_features(), config.bias),
        ),
        None => println!("   input:  identity (widths match)"),
    }
    for (i, head) in model.output_projections().iter().enumerate() {
        println!("   out[{i}]: {}", head.describe());
    }
    println!();

    println!(
        "  Initialized: {}",
        if model.is_initialized() { "yes" } else { "no (parameters pending)" },
    );
    Ok(())
}

fn parameter_count(in_features: usize, out_features: usize, bias: bool) -> usize {
    in_features * out_features + if bias { out_features } else { 0 }
}
