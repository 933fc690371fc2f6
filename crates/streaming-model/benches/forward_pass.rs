// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for chunked forward passes through the shell.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use streaming_model::{unit_stack, ShellConfig, StreamingTransformer};
use tensor_core::{DType, Device, Shape, Tensor};

fn build_shell(model_width: usize, layer_count: usize) -> StreamingTransformer {
    let config = ShellConfig {
        model_width,
        head_count: 8,
        layer_count,
        feed_forward_widths: vec![model_width * 4],
        enable_profiling: false,
        ..Default::default()
    };
    let units = unit_stack("identity", layer_count).unwrap();
    StreamingTransformer::new(config, units).unwrap()
}

fn bench_forward_chunk(c: &mut Criterion) {
    let shell = build_shell(512, 8);
    let x = Tensor::zeros(Shape::rank3(1, 25, 512), DType::F32, Device::Cpu).unwrap();
    c.bench_function("forward_1x25x512", |bench| {
        bench.iter(|| shell.forward(black_box(&x), None).unwrap())
    });
}

fn bench_streaming_chunks(c: &mut Criterion) {
    let shell = build_shell(256, 4);
    let x = Tensor::zeros(Shape::rank3(2, 10, 256), DType::F32, Device::Cpu).unwrap();
    c.bench_function("streaming_10_chunks_2x10x256", |bench| {
        bench.iter(|| {
            let mut state = shell.streaming_state(2).unwrap();
            for _ in 0..10 {
                shell.forward(black_box(&x), Some(&mut state)).unwrap();
            }
            state
        })
    });
}

criterion_group!(benches, bench_forward_chunk, bench_streaming_chunks);
criterion_main!(benches);
