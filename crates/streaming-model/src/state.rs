// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-sequence streaming state.
//!
//! A [`StreamingState`] tracks, for each batch row, the next absolute
//! time index the sequence expects. It is an explicit, caller-owned
//! handle: the shell takes it as a parameter on every forward call and
//! advances it, but never stores it. One state per logical sequence;
//! never share a state across simultaneous forward calls.

use crate::ModelError;
use tensor_core::{DType, Device, Shape, Tensor};

/// Mutable per-batch-row position offsets threaded across chunked
/// forward calls.
///
/// # Lifecycle
/// Created once per logical conversation/sequence via
/// [`crate::StreamingTransformer::streaming_state`], advanced in place
/// after every forward call that carries it, reset (fully or per
/// selected row) on sequence boundaries, and discarded when the
/// conversation ends.
#[derive(Debug, Clone)]
pub struct StreamingState {
    batch_size: usize,
    offsets: Tensor,
    exec_mask: Option<Vec<bool>>,
}

impl StreamingState {
    /// Creates a state with every offset at zero.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidConfiguration`] for a zero batch size.
    pub fn new(batch_size: usize) -> Result<Self, ModelError> {
        if batch_size == 0 {
            return Err(ModelError::InvalidConfiguration(
                "streaming state requires a positive batch size".into(),
            ));
        }
        Ok(Self {
            batch_size,
            offsets: Tensor::zeros(Shape::vector(batch_size), DType::I32, Device::Cpu)?,
            exec_mask: None,
        })
    }

    /// Returns the batch size this state was created for.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the offsets tensor (shape `[batch_size]`, i32).
    pub fn offsets(&self) -> &Tensor {
        &self.offsets
    }

    /// Returns the offset for a batch row.
    ///
    /// A row index beyond the state's batch size is clamped to the last
    /// valid row. This keeps a state usable with an oversized input
    /// batch (degraded compatibility) instead of panicking; the shell
    /// logs when the clamp engages.
    pub fn offset(&self, row: usize) -> i32 {
        let idx = row.min(self.batch_size - 1);
        self.offsets.as_i32_slice()[idx]
    }

    /// Resets offsets to zero.
    ///
    /// Without a mask, every offset is zeroed. With a mask, exactly the
    /// rows `i < min(mask.len(), batch_size)` with `mask[i] == true` are
    /// zeroed; rows beyond the mask's length are *never* reset — callers
    /// wanting a full reset must omit the mask.
    pub fn reset(&mut self, mask: Option<&[bool]>) {
        let offsets = self.offsets.as_i32_slice_mut();
        match mask {
            None => offsets.iter_mut().for_each(|o| *o = 0),
            Some(mask) => {
                for i in 0..mask.len().min(offsets.len()) {
                    if mask[i] {
                        offsets[i] = 0;
                    }
                }
            }
        }
    }

    /// Installs a per-row execution mask.
    ///
    /// Rows whose entry is `false` are considered inactive (padding) and
    /// do not advance; rows beyond the mask's length count as active.
    pub fn set_exec_mask(&mut self, mask: Vec<bool>) {
        self.exec_mask = Some(mask);
    }

    /// Removes the execution mask; every row advances again.
    pub fn clear_exec_mask(&mut self) {
        self.exec_mask = None;
    }

    /// Returns the execution mask, if one is installed.
    pub fn exec_mask(&self) -> Option<&[bool]> {
        self.exec_mask.as_deref()
    }

    /// Advances every active row's offset by `steps`.
    ///
    /// Called by the shell after each forward chunk with the chunk's
    /// time length.
    pub fn advance(&mut self, steps: usize) {
        let mask = self.exec_mask.as_deref();
        let offsets = self.offsets.as_i32_slice_mut();
        for (row, offset) in offsets.iter_mut().enumerate() {
            let active = mask.map_or(true, |m| m.get(row).copied().unwrap_or(true));
            if active {
                *offset += steps as i32;
            }
        }
    }
}
