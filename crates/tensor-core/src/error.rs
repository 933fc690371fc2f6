// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor operations.
//!
//! Every error here signals a caller programming error: all failures are
//! synchronous and non-retryable, and nothing is swallowed or retried
//! internally.

use crate::Shape;

/// Errors that can occur during tensor construction and operations.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// A construction request contained a non-positive dimension.
    #[error("invalid shape {dims:?}: every dimension must be positive")]
    InvalidShape { dims: Vec<usize> },

    /// A range construction was requested with a zero step.
    #[error("invalid range: step must be non-zero (start {start}, stop {stop})")]
    InvalidRange { start: f64, stop: f64 },

    /// Two tensors have incompatible shapes for the requested operation.
    #[error("incompatible shapes for {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// Transpose was requested for a rank or axis pair outside the
    /// supported rank-3 `(1, 2)` case.
    #[error("unsupported transpose: rank {rank}, axes ({}, {})", axes.0, axes.1)]
    UnsupportedTranspose { rank: usize, axes: (usize, usize) },

    /// The requested data type is not supported for this operation.
    #[error("unsupported dtype {dtype} for operation {op}")]
    UnsupportedDType {
        op: &'static str,
        dtype: crate::DType,
    },

    /// The provided buffer size does not match the expected size for the
    /// given shape and dtype.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}
