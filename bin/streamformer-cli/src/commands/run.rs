// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `streamformer run` command: stream synthetic chunks through the
//! projected transformer and report shapes, offsets, and timing.

use std::time::Instant;
use streaming_model::{unit_stack, Layout, ProjectedConfig, ProjectedTransformer};
use tensor_core::{ops, DType, Device, Shape, Tensor};

pub fn execute(
    config: ProjectedConfig,
    batch: usize,
    chunks: usize,
    chunk_len: usize,
) -> anyhow::Result<()> {
    println!("streamformer · chunked streaming demo");
    println!();
    println!("  Config:");
    println!("   Input width:   {}", config.input_width);
    println!("   Output widths: {:?}", config.output_widths);
    println!("   Model width:   {}", config.shell.model_width);
    println!("   Layers:        {}", config.shell.layer_count);
    println!("   Positional:    {}", config.shell.positional_embedding);
    println!("   Layout:        {}", config.layout);
    println!("   Batch:         {batch} × {chunks} chunks × {chunk_len} steps");
    println!();

    // Identity units keep the demo free of model files; the shapes,
    // positional codes, and offsets behave exactly as with real units.
    let units = unit_stack("identity", config.shell.layer_count)?;
    let input_width = config.input_width;
    let layout = config.layout_kind()?;

    let mut model = ProjectedTransformer::new(config, units)?;
    model.init_zeroed(DType::F32)?;

    let mut state = model.streaming_state(batch)?;

    // Synthetic input: a ramp over every (row, step, channel) slot so
    // chunks are non-trivial without model files.
    let shape = match layout {
        Layout::SequenceFirst => Shape::rank3(batch, chunk_len, input_width),
        Layout::ChannelFirst => Shape::rank3(batch, input_width, chunk_len),
    };
    let n = shape.num_elements();
    let ramp = Tensor::arange(0.0, n as f64, 1.0, DType::F32, Device::Cpu)?;
    let dims: Vec<i64> = shape.dims().iter().map(|&d| d as i64).collect();
    let x = ops::reshape(&ramp, &dims)?;

    for chunk in 0..chunks {
        let start = Instant::now();
        let outputs = model.forward(&x, Some(&mut state))?;
        let elapsed = start.elapsed();

        let shapes: Vec<String> = outputs.iter().map(|o| o.shape().to_string()).collect();
        println!(
            "  chunk {chunk}: {:.3}ms, outputs {}, offsets {:?}",
            elapsed.as_secs_f64() * 1000.0,
            shapes.join(" "),
            state.offsets().as_i32_slice(),
        );
    }

    println!();
    println!("  Done: {} steps consumed per active row.", chunks * chunk_len);
    Ok(())
}
