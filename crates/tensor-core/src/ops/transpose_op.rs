// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Rank-3 axis transpose.

use crate::{Shape, Tensor, TensorError};

/// Swaps axes 1 and 2 of a rank-3 tensor, converting between the
/// `(batch, time, channel)` and `(batch, channel, time)` layouts.
///
/// Only rank 3 with the axis pair `(1, 2)` is supported; the resulting
/// stride pattern is not representable as a view over row-major
/// storage, so the output always owns *fresh* storage (unlike
/// [`crate::ops::reshape`], which aliases). Works for every dtype:
/// elements are moved as opaque byte groups.
///
/// # Errors
/// Returns [`TensorError::UnsupportedTranspose`] for any other rank or
/// axis pair.
pub fn transpose(tensor: &Tensor, axis_a: usize, axis_b: usize) -> Result<Tensor, TensorError> {
    let rank = tensor.shape().rank();
    if rank != 3 || (axis_a, axis_b) != (1, 2) {
        return Err(TensorError::UnsupportedTranspose {
            rank,
            axes: (axis_a, axis_b),
        });
    }

    let dims = tensor.shape().dims();
    let (b, t, c) = (dims[0], dims[1], dims[2]);
    let elem = tensor.dtype().size_bytes();

    let src = tensor.as_bytes();
    let mut dst = vec![0u8; src.len()];
    for bi in 0..b {
        for ti in 0..t {
            let row = ((bi * t + ti) * c) * elem;
            for ci in 0..c {
                let s = row + ci * elem;
                let d = ((bi * c + ci) * t + ti) * elem;
                dst[d..d + elem].copy_from_slice(&src[s..s + elem]);
            }
        }
    }

    Ok(Tensor::from_raw(
        Shape::rank3(b, c, t),
        tensor.dtype(),
        tensor.device(),
        dst,
    ))
}
