// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reshape with single-dimension inference.

use crate::{Shape, Tensor, TensorError};

/// Reinterprets `tensor` under a new shape, sharing its storage.
///
/// At most one entry of `dims` may be `-1` ("infer"); the inferred
/// dimension is `num_elements / product(other dims)`. The result is a
/// *view*: it aliases the input's buffer, observable via
/// [`Tensor::shares_storage`]. No data is moved.
///
/// # Errors
/// - [`TensorError::ShapeMismatch`] if the resulting element count
///   differs from the input's, or if more than one dimension requests
///   inference.
/// - [`TensorError::InvalidShape`] for a zero or negative (non-`-1`)
///   entry.
///
/// # Examples
/// ```
/// use tensor_core::{ops, Tensor, Shape, DType, Device};
/// let t = Tensor::arange(0.0, 6.0, 1.0, DType::F32, Device::Cpu).unwrap();
/// let m = ops::reshape(&t, &[2, -1]).unwrap();
/// assert_eq!(m.shape(), &Shape::matrix(2, 3));
/// assert!(m.shares_storage(&t));
/// ```
pub fn reshape(tensor: &Tensor, dims: &[i64]) -> Result<Tensor, TensorError> {
    let total = tensor.num_elements();

    let mut inferred: Option<usize> = None;
    let mut known = 1usize;
    for (i, &d) in dims.iter().enumerate() {
        if d == -1 {
            if inferred.is_some() {
                // Zeroes in the reported shape mark the inferred slots.
                return Err(TensorError::ShapeMismatch {
                    op: "reshape",
                    lhs: tensor.shape().clone(),
                    rhs: sanitize(dims),
                });
            }
            inferred = Some(i);
        } else if d <= 0 {
            return Err(TensorError::InvalidShape {
                dims: dims.iter().map(|&d| d.max(0) as usize).collect(),
            });
        } else {
            known *= d as usize;
        }
    }

    let mut resolved: Vec<usize> = dims.iter().map(|&d| d.max(0) as usize).collect();
    if let Some(slot) = inferred {
        if known == 0 || total % known != 0 {
            return Err(TensorError::ShapeMismatch {
                op: "reshape",
                lhs: tensor.shape().clone(),
                rhs: sanitize(dims),
            });
        }
        resolved[slot] = total / known;
    } else if known != total {
        return Err(TensorError::ShapeMismatch {
            op: "reshape",
            lhs: tensor.shape().clone(),
            rhs: Shape::new(resolved),
        });
    }

    Ok(tensor.with_shape(Shape::new(resolved)))
}

fn sanitize(dims: &[i64]) -> Shape {
    Shape::new(dims.iter().map(|&d| d.max(0) as usize).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DType, Device};

    fn arange(n: usize) -> Tensor {
        Tensor::arange(0.0, n as f64, 1.0, DType::F32, Device::Cpu).unwrap()
    }

    #[test]
    fn test_reshape_identity() {
        let t = Tensor::zeros(Shape::matrix(2, 3), DType::F32, Device::Cpu).unwrap();
        let r = reshape(&t, &[2, 3]).unwrap();
        assert_eq!(r.shape(), t.shape());
        assert_eq!(r.as_f32_slice(), t.as_f32_slice());
        assert!(r.shares_storage(&t));
    }

    #[test]
    fn test_reshape_shares_storage() {
        let t = arange(12);
        let r = reshape(&t, &[3, 4]).unwrap();
        assert!(r.shares_storage(&t));
        assert_eq!(r.shape(), &Shape::matrix(3, 4));
        assert_eq!(r.as_f32_slice(), t.as_f32_slice());
    }

    #[test]
    fn test_reshape_infer() {
        let t = arange(24);
        let r = reshape(&t, &[2, -1, 4]).unwrap();
        assert_eq!(r.shape(), &Shape::rank3(2, 3, 4));
    }

    #[test]
    fn test_reshape_infer_full() {
        let t = Tensor::zeros(Shape::rank3(2, 3, 4), DType::I32, Device::Cpu).unwrap();
        let r = reshape(&t, &[-1]).unwrap();
        assert_eq!(r.shape(), &Shape::vector(24));
    }

    #[test]
    fn test_reshape_count_mismatch() {
        let t = arange(6);
        let err = reshape(&t, &[2, 2]).unwrap_err();
        assert!(matches!(err, TensorError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_reshape_infer_indivisible() {
        let t = arange(7);
        let err = reshape(&t, &[2, -1]).unwrap_err();
        assert!(matches!(err, TensorError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_reshape_double_infer() {
        let t = arange(8);
        let err = reshape(&t, &[-1, -1]).unwrap_err();
        assert!(matches!(err, TensorError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_reshape_rejects_zero_dim() {
        let t = arange(6);
        let err = reshape(&t, &[6, 0]).unwrap_err();
        assert!(matches!(err, TensorError::InvalidShape { .. }));
    }

    #[test]
    fn test_reshape_rejects_other_negatives() {
        let t = arange(6);
        let err = reshape(&t, &[-2, 3]).unwrap_err();
        assert!(matches!(err, TensorError::InvalidShape { .. }));
    }
}
