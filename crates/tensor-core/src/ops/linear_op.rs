// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dense linear projection over the last axis.

use crate::{DType, Shape, Tensor, TensorError};

/// Applies a dense linear map over the last axis: `y = x @ Wᵗ (+ bias)`.
///
/// `x` is `[..., in_features]`, `weight` is `[out_features, in_features]`
/// and the optional `bias` is `[out_features]`. Leading dimensions are
/// flattened and restored, so the output is `[..., out_features]`.
/// Accumulation happens in the tensor's own element type; only the float
/// dtypes are supported.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] when the feature widths
/// disagree (or `weight`/`bias` have the wrong rank) and
/// [`TensorError::UnsupportedDType`] for non-float or mixed dtypes.
pub fn linear(
    x: &Tensor,
    weight: &Tensor,
    bias: Option<&Tensor>,
) -> Result<Tensor, TensorError> {
    if !x.dtype().is_float() || weight.dtype() != x.dtype() {
        return Err(TensorError::UnsupportedDType {
            op: "linear",
            dtype: if x.dtype().is_float() {
                weight.dtype()
            } else {
                x.dtype()
            },
        });
    }
    if weight.shape().rank() != 2 {
        return Err(TensorError::ShapeMismatch {
            op: "linear (weight)",
            lhs: x.shape().clone(),
            rhs: weight.shape().clone(),
        });
    }

    let in_features = weight.shape().dims()[1];
    let out_features = weight.shape().dims()[0];
    let x_dims = x.shape().dims();
    if x_dims.is_empty() || x_dims[x_dims.len() - 1] != in_features {
        return Err(TensorError::ShapeMismatch {
            op: "linear",
            lhs: x.shape().clone(),
            rhs: weight.shape().clone(),
        });
    }

    if let Some(b) = bias {
        if b.dtype() != x.dtype() {
            return Err(TensorError::UnsupportedDType {
                op: "linear (bias)",
                dtype: b.dtype(),
            });
        }
        if b.shape().dims() != [out_features] {
            return Err(TensorError::ShapeMismatch {
                op: "linear (bias)",
                lhs: weight.shape().clone(),
                rhs: b.shape().clone(),
            });
        }
    }

    let rows = x.num_elements() / in_features;
    let mut out_dims = x_dims.to_vec();
    *out_dims.last_mut().expect("checked non-empty above") = out_features;
    let out_shape = Shape::new(out_dims);

    let out = match x.dtype() {
        DType::F32 => {
            let mut y = vec![0.0f32; rows * out_features];
            linear_generic(
                x.as_f32_slice(),
                weight.as_f32_slice(),
                bias.map(|b| b.as_f32_slice()),
                &mut y,
                rows,
                in_features,
                out_features,
            );
            Tensor::from_f32(out_shape, &y, x.device())?
        }
        DType::F64 => {
            let mut y = vec![0.0f64; rows * out_features];
            linear_generic(
                x.as_f64_slice(),
                weight.as_f64_slice(),
                bias.map(|b| b.as_f64_slice()),
                &mut y,
                rows,
                in_features,
                out_features,
            );
            Tensor::from_f64(out_shape, &y, x.device())?
        }
        DType::I32 => unreachable!("rejected above"),
    };
    Ok(out)
}

/// Portable projection kernel: explicit triple loop over
/// (rows × out features × in features), row-major on both operands.
fn linear_generic<T>(
    x: &[T],
    w: &[T],
    bias: Option<&[T]>,
    y: &mut [T],
    rows: usize,
    in_features: usize,
    out_features: usize,
) where
    T: Copy + Default + std::ops::Mul<Output = T> + std::ops::Add<Output = T>,
{
    for r in 0..rows {
        let x_row = &x[r * in_features..(r + 1) * in_features];
        let y_row = &mut y[r * out_features..(r + 1) * out_features];
        for o in 0..out_features {
            let w_row = &w[o * in_features..(o + 1) * in_features];
            let mut acc = T::default();
            for k in 0..in_features {
                acc = acc + x_row[k] * w_row[k];
            }
            y_row[o] = match bias {
                Some(b) => acc + b[o],
                None => acc,
            };
        }
    }
}
