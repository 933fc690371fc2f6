// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Elementwise arithmetic: `add` and `scale`.

use crate::{DType, Tensor, TensorError};

/// Elementwise sum of two tensors of identical shape and dtype.
///
/// No broadcasting: the shapes must match exactly. The output carries
/// the left operand's device tag.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if the shapes differ and
/// [`TensorError::UnsupportedDType`] if the dtypes differ.
pub fn add(lhs: &Tensor, rhs: &Tensor) -> Result<Tensor, TensorError> {
    if lhs.shape() != rhs.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "add",
            lhs: lhs.shape().clone(),
            rhs: rhs.shape().clone(),
        });
    }
    if lhs.dtype() != rhs.dtype() {
        return Err(TensorError::UnsupportedDType {
            op: "add",
            dtype: rhs.dtype(),
        });
    }

    let out = match lhs.dtype() {
        DType::F32 => {
            let sum: Vec<f32> = lhs
                .as_f32_slice()
                .iter()
                .zip(rhs.as_f32_slice())
                .map(|(&a, &b)| a + b)
                .collect();
            Tensor::from_f32(lhs.shape().clone(), &sum, lhs.device())?
        }
        DType::F64 => {
            let sum: Vec<f64> = lhs
                .as_f64_slice()
                .iter()
                .zip(rhs.as_f64_slice())
                .map(|(&a, &b)| a + b)
                .collect();
            Tensor::from_f64(lhs.shape().clone(), &sum, lhs.device())?
        }
        DType::I32 => {
            let sum: Vec<i32> = lhs
                .as_i32_slice()
                .iter()
                .zip(rhs.as_i32_slice())
                .map(|(&a, &b)| a.wrapping_add(b))
                .collect();
            Tensor::from_i32(lhs.shape().clone(), &sum, lhs.device())?
        }
    };
    Ok(out)
}

/// Elementwise multiplication by a scalar.
///
/// Succeeds for any shape and dtype. Float tensors multiply in their
/// own precision; `I32` goes through `f64` and truncates toward zero.
pub fn scale(tensor: &Tensor, factor: f64) -> Result<Tensor, TensorError> {
    let out = match tensor.dtype() {
        DType::F32 => {
            let f = factor as f32;
            let scaled: Vec<f32> = tensor.as_f32_slice().iter().map(|&v| v * f).collect();
            Tensor::from_f32(tensor.shape().clone(), &scaled, tensor.device())?
        }
        DType::F64 => {
            let scaled: Vec<f64> = tensor.as_f64_slice().iter().map(|&v| v * factor).collect();
            Tensor::from_f64(tensor.shape().clone(), &scaled, tensor.device())?
        }
        DType::I32 => {
            let scaled: Vec<i32> = tensor
                .as_i32_slice()
                .iter()
                .map(|&v| (v as f64 * factor) as i32)
                .collect();
            Tensor::from_i32(tensor.shape().clone(), &scaled, tensor.device())?
        }
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Device, Shape};

    fn t32(values: &[f32]) -> Tensor {
        Tensor::from_f32(Shape::vector(values.len()), values, Device::Cpu).unwrap()
    }

    #[test]
    fn test_add_f32() {
        let a = t32(&[1.0, 2.0, 3.0]);
        let b = t32(&[10.0, 20.0, 30.0]);
        let c = add(&a, &b).unwrap();
        assert_eq!(c.as_f32_slice(), &[11.0, 22.0, 33.0]);
    }

    #[test]
    fn test_add_commutative() {
        let a = t32(&[1.5, -2.0, 0.25]);
        let b = t32(&[0.5, 4.0, -0.25]);
        let ab = add(&a, &b).unwrap();
        let ba = add(&b, &a).unwrap();
        assert_eq!(ab.as_f32_slice(), ba.as_f32_slice());
    }

    #[test]
    fn test_add_i32() {
        let a = Tensor::from_i32(Shape::vector(2), &[1, 2], Device::Cpu).unwrap();
        let b = Tensor::from_i32(Shape::vector(2), &[3, 4], Device::Cpu).unwrap();
        assert_eq!(add(&a, &b).unwrap().as_i32_slice(), &[4, 6]);
    }

    #[test]
    fn test_add_shape_mismatch() {
        let a = Tensor::zeros(Shape::vector(3), crate::DType::F32, Device::Cpu).unwrap();
        let b = Tensor::zeros(Shape::vector(4), crate::DType::F32, Device::Cpu).unwrap();
        let err = add(&a, &b).unwrap_err();
        assert!(matches!(err, TensorError::ShapeMismatch { op: "add", .. }));
    }

    #[test]
    fn test_add_dtype_mismatch() {
        let a = Tensor::zeros(Shape::vector(3), crate::DType::F32, Device::Cpu).unwrap();
        let b = Tensor::zeros(Shape::vector(3), crate::DType::F64, Device::Cpu).unwrap();
        let err = add(&a, &b).unwrap_err();
        assert!(matches!(err, TensorError::UnsupportedDType { .. }));
    }

    #[test]
    fn test_add_allocates_fresh_storage() {
        let a = t32(&[1.0]);
        let b = t32(&[2.0]);
        let c = add(&a, &b).unwrap();
        assert!(!c.shares_storage(&a));
        assert!(!c.shares_storage(&b));
    }

    #[test]
    fn test_scale_identity() {
        let a = t32(&[1.0, -2.0, 3.5]);
        let s = scale(&a, 1.0).unwrap();
        assert_eq!(s.as_f32_slice(), a.as_f32_slice());
    }

    #[test]
    fn test_scale_zero() {
        let a = t32(&[1.0, -2.0, 3.5]);
        let s = scale(&a, 0.0).unwrap();
        assert!(s.as_f32_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_scale_i32_truncates() {
        let a = Tensor::from_i32(Shape::vector(3), &[1, 2, 3], Device::Cpu).unwrap();
        let s = scale(&a, 1.5).unwrap();
        assert_eq!(s.as_i32_slice(), &[1, 3, 4]);
    }

    #[test]
    fn test_scale_f64() {
        let a = Tensor::from_f64(Shape::vector(2), &[2.0, 4.0], Device::Cpu).unwrap();
        let s = scale(&a, 0.5).unwrap();
        assert_eq!(s.as_f64_slice(), &[1.0, 2.0]);
    }
}
