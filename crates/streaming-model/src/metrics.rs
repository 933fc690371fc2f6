// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Forward-pass profiling metrics.
//!
//! [`ForwardMetrics`] collects per-layer and aggregate timing data for
//! one forward chunk. Collection is gated on the shell's
//! `enable_profiling` configuration flag.

use std::time::Duration;

/// Metrics for a single layer unit's execution.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LayerMetrics {
    /// Layer label (`"<unit name>.<index>"`).
    pub layer_name: String,
    /// Time spent inside the unit's forward.
    pub compute_duration: Duration,
}

/// Aggregate metrics for one forward chunk.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ForwardMetrics {
    /// Total wall-clock time for the chunk, including embedding
    /// injection and offset bookkeeping.
    pub total_duration: Duration,
    /// Total time spent inside layer units.
    pub total_compute_duration: Duration,
    /// Per-layer metrics, in stack order.
    pub layer_metrics: Vec<LayerMetrics>,
    /// Number of (batch × time) positions processed.
    pub frames_processed: usize,
}

impl ForwardMetrics {
    /// Creates an empty metrics container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records metrics for a single layer.
    pub fn record_layer(&mut self, name: String, compute: Duration) {
        self.total_compute_duration += compute;
        self.layer_metrics.push(LayerMetrics {
            layer_name: name,
            compute_duration: compute,
        });
    }

    /// Finalises metrics with the total wall-clock time and frame count.
    pub fn finalise(&mut self, total: Duration, frames: usize) {
        self.total_duration = total;
        self.frames_processed = frames;
    }

    /// Returns frames per second throughput.
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.total_duration.as_secs_f64();
        if secs <= 0.0 || self.frames_processed == 0 {
            return 0.0;
        }
        self.frames_processed as f64 / secs
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        format!(
            "Forward: {:.3}ms total, {} layers, {:.3}ms in units, \
             {} frames ({:.0} frames/s)",
            self.total_duration.as_secs_f64() * 1000.0,
            self.layer_metrics.len(),
            self.total_compute_duration.as_secs_f64() * 1000.0,
            self.frames_processed,
            self.frames_per_second(),
        )
    }
}
