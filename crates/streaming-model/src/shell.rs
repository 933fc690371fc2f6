// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The streaming transformer shell.
//!
//! Per forward chunk, given `x` of shape `[batch, time, channel]`:
//! ```text
//! positions = local time index + per-row offset   (from the state)
//!     │
//!     ▼
//! x += positional_scale * sin_embedding(positions)
//!     │
//!     ▼
//! layer unit stack (ordered, shape-preserving)
//!     │
//!     ▼
//! state.advance(time)                             (exec-mask aware)
//! ```
//!
//! The shell never stores a streaming state: the caller owns the handle
//! and passes it explicitly, which keeps one shell reusable across
//! independent sequences in a single process.

use crate::{
    sin_embedding, ForwardMetrics, LayerUnit, ModelError, PositionalEmbedding, ShellConfig,
    StreamingState,
};
use std::time::Instant;
use tensor_core::{ops, Shape, Tensor, TensorError};

/// Orchestrates positional encoding, the pluggable layer stack, and
/// offset bookkeeping around chunked forward calls.
///
/// # Example
/// ```
/// use streaming_model::{unit_stack, ShellConfig, StreamingTransformer};
/// use tensor_core::{DType, Device, Shape, Tensor};
///
/// # fn example() -> Result<(), streaming_model::ModelError> {
/// let config = ShellConfig { model_width: 16, head_count: 2, ..Default::default() };
/// let units = unit_stack("identity", config.layer_count)?;
/// let shell = StreamingTransformer::new(config, units)?;
///
/// let mut state = shell.streaming_state(1)?;
/// let x = Tensor::zeros(Shape::rank3(1, 4, 16), DType::F32, Device::Cpu)?;
/// let y = shell.forward(&x, Some(&mut state))?;
/// assert_eq!(y.shape(), x.shape());
/// assert_eq!(state.offsets().as_i32_slice(), &[4]);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct StreamingTransformer {
    config: ShellConfig,
    positional: PositionalEmbedding,
    units: Vec<Box<dyn LayerUnit>>,
}

impl StreamingTransformer {
    /// Creates a shell from a validated configuration and an ordered
    /// unit stack.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidConfiguration`] for any invalid
    /// config field (including an unrecognized positional-embedding
    /// kind) or a unit count that differs from `layer_count`. Nothing
    /// is deferred to the first forward call.
    pub fn new(config: ShellConfig, units: Vec<Box<dyn LayerUnit>>) -> Result<Self, ModelError> {
        config.validate()?;
        let positional = config.positional_kind()?;
        if units.len() != config.layer_count {
            return Err(ModelError::InvalidConfiguration(format!(
                "expected {} layer units, got {}",
                config.layer_count,
                units.len()
            )));
        }
        tracing::info!(
            "streaming transformer: {} layers, width {}, positional '{}'",
            config.layer_count,
            config.model_width,
            positional,
        );
        Ok(Self {
            config,
            positional,
            units,
        })
    }

    /// Returns the shell's configuration.
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Returns the resolved positional-embedding kind.
    pub fn positional(&self) -> PositionalEmbedding {
        self.positional
    }

    /// Returns the installed unit stack, in application order.
    pub fn units(&self) -> &[Box<dyn LayerUnit>] {
        &self.units
    }

    /// Creates a streaming state for `batch_size` sequences, all
    /// offsets at zero.
    pub fn streaming_state(&self, batch_size: usize) -> Result<StreamingState, ModelError> {
        StreamingState::new(batch_size)
    }

    /// Runs one forward chunk.
    ///
    /// `x` must be `[batch, time, channel]`. Without a state, every row
    /// starts at position zero. With a state, each row starts at its
    /// current offset, and all active offsets are advanced by the
    /// chunk's time length afterwards. The output keeps the input's
    /// dtype and device tag.
    pub fn forward(
        &self,
        x: &Tensor,
        state: Option<&mut StreamingState>,
    ) -> Result<Tensor, ModelError> {
        self.run(x, state, false).map(|(out, _)| out)
    }

    /// Like [`forward`](StreamingTransformer::forward), additionally
    /// returning per-layer timing metrics.
    ///
    /// Metrics are only collected when the configuration's
    /// `enable_profiling` flag is set; otherwise the returned container
    /// holds totals but no per-layer entries.
    pub fn forward_profiled(
        &self,
        x: &Tensor,
        state: Option<&mut StreamingState>,
    ) -> Result<(Tensor, ForwardMetrics), ModelError> {
        self.run(x, state, self.config.enable_profiling)
    }

    fn run(
        &self,
        x: &Tensor,
        mut state: Option<&mut StreamingState>,
        profiling: bool,
    ) -> Result<(Tensor, ForwardMetrics), ModelError> {
        let run_start = Instant::now();

        let dims = x.shape().dims();
        if dims.len() != 3 {
            return Err(TensorError::ShapeMismatch {
                op: "forward (expects [batch, time, channels])",
                lhs: x.shape().clone(),
                rhs: Shape::rank3(0, 0, 0),
            }
            .into());
        }
        let (batch, time, channels) = (dims[0], dims[1], dims[2]);

        tracing::debug!(
            "forward chunk: shape {}, state attached: {}",
            x.shape(),
            state.is_some(),
        );

        let mut metrics = ForwardMetrics::new();

        // ── Positional injection ───────────────────────────────────
        let mut hidden = if self.positional.has_sinusoidal() {
            let positions = self.positions(batch, time, x, state.as_deref())?;
            let embedding =
                sin_embedding(&positions, channels, self.config.max_period, x.dtype())?;
            let embedding = ops::scale(&embedding, self.config.positional_scale)?;
            ops::add(x, &embedding)?
        } else {
            // Rope is applied inside the units; none needs nothing here.
            x.clone()
        };

        // ── Layer stack ────────────────────────────────────────────
        for (index, unit) in self.units.iter().enumerate() {
            let label = format!("{}.{index}", unit.name());
            let layer_start = Instant::now();

            let out = unit.forward(&hidden).map_err(|e| match e {
                ModelError::Tensor(source) => ModelError::Layer {
                    layer: label.clone(),
                    source,
                },
                other => other,
            })?;

            if out.shape() != hidden.shape() {
                return Err(ModelError::Layer {
                    layer: label,
                    source: TensorError::ShapeMismatch {
                        op: "layer forward",
                        lhs: hidden.shape().clone(),
                        rhs: out.shape().clone(),
                    },
                });
            }

            if profiling {
                metrics.record_layer(label, layer_start.elapsed());
            }
            hidden = out;
        }

        // ── Offset advancement ─────────────────────────────────────
        if let Some(state) = state.as_deref_mut() {
            state.advance(time);
            tracing::debug!(
                "offsets advanced by {time}: {:?}",
                state.offsets().as_i32_slice(),
            );
        }

        metrics.finalise(run_start.elapsed(), batch * time);
        if profiling {
            tracing::debug!("{}", metrics.summary());
        }
        Ok((hidden, metrics))
    }

    /// Builds the absolute-position tensor `position[b, t] = t + offset[b]`.
    fn positions(
        &self,
        batch: usize,
        time: usize,
        x: &Tensor,
        state: Option<&StreamingState>,
    ) -> Result<Tensor, ModelError> {
        if let Some(s) = state {
            if s.batch_size() < batch {
                tracing::debug!(
                    "input batch {batch} exceeds state batch {}; clamping offset rows",
                    s.batch_size(),
                );
            }
        }
        let mut values = Vec::with_capacity(batch * time);
        for row in 0..batch {
            let offset = state.map_or(0, |s| s.offset(row));
            for t in 0..time {
                values.push(offset + t as i32);
            }
        }
        Ok(Tensor::from_i32(
            Shape::matrix(batch, time),
            &values,
            x.device(),
        )?)
    }
}

impl std::fmt::Debug for StreamingTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingTransformer")
            .field("layer_count", &self.units.len())
            .field("model_width", &self.config.model_width)
            .field("positional", &self.positional)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_stack;
    use tensor_core::{DType, Device};

    fn config(width: usize, layers: usize, positional: &str) -> ShellConfig {
        ShellConfig {
            model_width: width,
            head_count: 1,
            layer_count: layers,
            feed_forward_widths: vec![width * 4],
            positional_embedding: positional.into(),
            ..Default::default()
        }
    }

    fn shell(width: usize, layers: usize, positional: &str) -> StreamingTransformer {
        let c = config(width, layers, positional);
        let units = unit_stack("identity", layers).unwrap();
        StreamingTransformer::new(c, units).unwrap()
    }

    #[test]
    fn test_new_rejects_unit_count_mismatch() {
        let c = config(8, 3, "sin");
        let units = unit_stack("identity", 2).unwrap();
        assert!(matches!(
            StreamingTransformer::new(c, units),
            Err(ModelError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_new_rejects_unknown_positional() {
        let c = config(8, 2, "learned");
        let units = unit_stack("identity", 2).unwrap();
        assert!(StreamingTransformer::new(c, units).is_err());
    }

    #[test]
    fn test_forward_none_positional_is_identity() {
        let s = shell(4, 2, "none");
        let x = Tensor::from_f32(
            Shape::rank3(1, 2, 4),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
            Device::Cpu,
        )
        .unwrap();
        let y = s.forward(&x, None).unwrap();
        assert_eq!(y.as_f32_slice(), x.as_f32_slice());
    }

    #[test]
    fn test_forward_rejects_rank_2() {
        let s = shell(4, 1, "sin");
        let x = Tensor::zeros(Shape::matrix(2, 4), DType::F32, Device::Cpu).unwrap();
        assert!(matches!(
            s.forward(&x, None),
            Err(ModelError::Tensor(TensorError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    fn test_forward_sin_on_zeros() {
        // With zero input and identity units the output IS the scaled
        // embedding: at t = 0 every pair is (sin 0, cos 0) = (0, 1).
        let s = shell(4, 1, "sin");
        let x = Tensor::zeros(Shape::rank3(1, 2, 4), DType::F32, Device::Cpu).unwrap();
        let y = s.forward(&x, None).unwrap();
        let v = y.as_f32_slice();
        assert_eq!(&v[0..4], &[0.0, 1.0, 0.0, 1.0]);
        // t = 1, d = 0 pair: (sin 1, cos 1).
        assert!((v[4] - 1.0f32.sin()).abs() < 1e-6);
        assert!((v[5] - 1.0f32.cos()).abs() < 1e-6);
    }

    #[test]
    fn test_positional_scale_zero_is_identity() {
        let c = ShellConfig {
            positional_scale: 0.0,
            ..config(4, 1, "sin")
        };
        let units = unit_stack("identity", 1).unwrap();
        let s = StreamingTransformer::new(c, units).unwrap();

        let x = Tensor::from_f32(Shape::rank3(1, 1, 4), &[9.0, 8.0, 7.0, 6.0], Device::Cpu)
            .unwrap();
        let y = s.forward(&x, None).unwrap();
        assert_eq!(y.as_f32_slice(), x.as_f32_slice());
    }

    #[test]
    fn test_offsets_shift_positions() {
        let s = shell(4, 1, "sin");

        // Consume 3 steps so the state's offset is 3.
        let mut state = s.streaming_state(1).unwrap();
        let warmup = Tensor::zeros(Shape::rank3(1, 3, 4), DType::F32, Device::Cpu).unwrap();
        s.forward(&warmup, Some(&mut state)).unwrap();
        assert_eq!(state.offsets().as_i32_slice(), &[3]);

        // The next chunk's first frame sits at absolute position 3.
        let x = Tensor::zeros(Shape::rank3(1, 1, 4), DType::F32, Device::Cpu).unwrap();
        let y = s.forward(&x, Some(&mut state)).unwrap();
        let v = y.as_f32_slice();
        assert!((v[0] - 3.0f32.sin()).abs() < 1e-6);
        assert!((v[1] - 3.0f32.cos()).abs() < 1e-6);
        assert_eq!(state.offsets().as_i32_slice(), &[4]);
    }

    #[test]
    fn test_exec_mask_freezes_row() {
        let s = shell(4, 1, "none");
        let mut state = s.streaming_state(3).unwrap();
        state.set_exec_mask(vec![true, false, true]);

        let x = Tensor::zeros(Shape::rank3(3, 5, 4), DType::F32, Device::Cpu).unwrap();
        s.forward(&x, Some(&mut state)).unwrap();
        assert_eq!(state.offsets().as_i32_slice(), &[5, 0, 5]);
    }

    #[test]
    fn test_batch_clamp_reuses_last_offset() {
        let s = shell(4, 1, "sin");

        // State sized for one row, input carries two: row 1 reads row
        // 0's offset (degraded compatibility).
        let mut state = s.streaming_state(1).unwrap();
        let warmup = Tensor::zeros(Shape::rank3(1, 2, 4), DType::F32, Device::Cpu).unwrap();
        s.forward(&warmup, Some(&mut state)).unwrap();

        let x = Tensor::zeros(Shape::rank3(2, 1, 4), DType::F32, Device::Cpu).unwrap();
        let y = s.forward(&x, Some(&mut state)).unwrap();
        let v = y.as_f32_slice();
        // Both rows were encoded at absolute position 2.
        assert_eq!(&v[0..4], &v[4..8]);
        assert!((v[0] - 2.0f32.sin()).abs() < 1e-6);
    }

    #[test]
    fn test_shape_contract_enforced() {
        struct Truncating;
        impl LayerUnit for Truncating {
            fn name(&self) -> &str {
                "truncating"
            }
            fn forward(&self, x: &Tensor) -> Result<Tensor, ModelError> {
                // Drops the last time step: breaks the contract.
                let dims = x.shape().dims();
                Ok(Tensor::zeros(
                    Shape::rank3(dims[0], dims[1] - 1, dims[2]),
                    x.dtype(),
                    x.device(),
                )?)
            }
        }

        let c = config(4, 1, "none");
        let s = StreamingTransformer::new(c, vec![Box::new(Truncating)]).unwrap();
        let x = Tensor::zeros(Shape::rank3(1, 3, 4), DType::F32, Device::Cpu).unwrap();
        let err = s.forward(&x, None).unwrap_err();
        match err {
            ModelError::Layer { layer, source } => {
                assert_eq!(layer, "truncating.0");
                assert!(matches!(source, TensorError::ShapeMismatch { .. }));
            }
            other => panic!("expected layer error, got {other:?}"),
        }
    }

    #[test]
    fn test_forward_profiled_collects_per_layer() {
        let s = shell(4, 3, "none");
        let x = Tensor::zeros(Shape::rank3(2, 4, 4), DType::F32, Device::Cpu).unwrap();
        let (_, m) = s.forward_profiled(&x, None).unwrap();
        assert_eq!(m.layer_metrics.len(), 3);
        assert_eq!(m.frames_processed, 8);
    }

    #[test]
    fn test_forward_profiled_respects_flag() {
        let c = ShellConfig {
            enable_profiling: false,
            ..config(4, 2, "none")
        };
        let units = unit_stack("identity", 2).unwrap();
        let s = StreamingTransformer::new(c, units).unwrap();
        let x = Tensor::zeros(Shape::rank3(1, 1, 4), DType::F32, Device::Cpu).unwrap();
        let (_, m) = s.forward_profiled(&x, None).unwrap();
        assert!(m.layer_metrics.is_empty());
    }

    #[test]
    fn test_output_preserves_dtype_and_device() {
        let s = shell(4, 2, "sin");
        let x = Tensor::zeros(Shape::rank3(1, 2, 4), DType::F64, Device::Gpu).unwrap();
        let y = s.forward(&x, None).unwrap();
        assert_eq!(y.dtype(), DType::F64);
        assert_eq!(y.device(), Device::Gpu);
    }
}
