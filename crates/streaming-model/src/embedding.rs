// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Sinusoidal positional-embedding generator.

use crate::ModelError;
use tensor_core::{DType, Shape, Tensor, TensorError};

/// Computes fixed sinusoidal position codes.
///
/// `positions` is an integer-valued `[batch, time]` tensor that has
/// already been offset-adjusted by the caller. The result has shape
/// `[batch, time, dim]` where, for each position `p` and even index `d`:
///
/// ```text
/// out[.., d]     = sin(p / max_period^(d/dim))
/// out[.., d + 1] = cos(p / max_period^(d/dim))
/// ```
///
/// The final odd slot is left at zero when `dim` is odd. Any scaling
/// (`positional_scale`) is applied by the caller after generation.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] unless `positions` is rank 2,
/// and [`TensorError::UnsupportedDType`] for a non-float output dtype.
pub fn sin_embedding(
    positions: &Tensor,
    dim: usize,
    max_period: f64,
    dtype: DType,
) -> Result<Tensor, ModelError> {
    if positions.shape().rank() != 2 {
        return Err(TensorError::ShapeMismatch {
            op: "sin_embedding (positions must be [batch, time])",
            lhs: positions.shape().clone(),
            rhs: Shape::matrix(0, 0),
        }
        .into());
    }
    if !dtype.is_float() {
        return Err(TensorError::UnsupportedDType {
            op: "sin_embedding",
            dtype,
        }
        .into());
    }

    let dims = positions.shape().dims();
    let (batch, time) = (dims[0], dims[1]);

    // One rate per sin/cos pair: 1 / max_period^(d/dim) for even d.
    let half = dim / 2;
    let rates: Vec<f64> = (0..half)
        .map(|i| max_period.powf(-((2 * i) as f64) / dim as f64))
        .collect();

    let pos = positions.to_f64_vec();
    let mut out = vec![0.0f64; batch * time * dim];
    for (row, &p) in pos.iter().enumerate() {
        let base = row * dim;
        for (i, &rate) in rates.iter().enumerate() {
            let angle = p * rate;
            out[base + 2 * i] = angle.sin();
            out[base + 2 * i + 1] = angle.cos();
        }
        // dim odd: out[base + dim - 1] stays 0.
    }

    let shape = Shape::rank3(batch, time, dim);
    let tensor = match dtype {
        DType::F32 => {
            let cast: Vec<f32> = out.iter().map(|&v| v as f32).collect();
            Tensor::from_f32(shape, &cast, positions.device())?
        }
        DType::F64 => Tensor::from_f64(shape, &out, positions.device())?,
        DType::I32 => unreachable!("rejected above"),
    };
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::Device;

    fn positions(values: &[i32], batch: usize, time: usize) -> Tensor {
        Tensor::from_i32(Shape::matrix(batch, time), values, Device::Cpu).unwrap()
    }

    #[test]
    fn test_shape() {
        let p = positions(&[0, 1, 2, 3, 4, 5], 2, 3);
        let e = sin_embedding(&p, 8, 10_000.0, DType::F32).unwrap();
        assert_eq!(e.shape(), &Shape::rank3(2, 3, 8));
    }

    #[test]
    fn test_position_zero() {
        // sin(0) = 0, cos(0) = 1 in every pair.
        let p = positions(&[0], 1, 1);
        let e = sin_embedding(&p, 4, 10_000.0, DType::F32).unwrap();
        assert_eq!(e.as_f32_slice(), &[0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_first_pair_is_raw_angle() {
        // d = 0 → rate = max_period^0 = 1, so the first pair is
        // (sin p, cos p) exactly.
        let p = positions(&[3], 1, 1);
        let e = sin_embedding(&p, 6, 10_000.0, DType::F64).unwrap();
        let v = e.as_f64_slice();
        assert!((v[0] - 3.0f64.sin()).abs() < 1e-12);
        assert!((v[1] - 3.0f64.cos()).abs() < 1e-12);
    }

    #[test]
    fn test_rate_follows_max_period() {
        // d = 2, dim = 4 → rate = max_period^(-1/2).
        let p = positions(&[7], 1, 1);
        let max_period = 100.0;
        let e = sin_embedding(&p, 4, max_period, DType::F64).unwrap();
        let rate = (100.0f64).powf(-0.5);
        let v = e.as_f64_slice();
        assert!((v[2] - (7.0 * rate).sin()).abs() < 1e-12);
        assert!((v[3] - (7.0 * rate).cos()).abs() < 1e-12);
    }

    #[test]
    fn test_odd_dim_tail_is_zero() {
        let p = positions(&[1, 2], 1, 2);
        let e = sin_embedding(&p, 5, 10_000.0, DType::F32).unwrap();
        let v = e.as_f32_slice();
        // Last slot of each position vector is untouched.
        assert_eq!(v[4], 0.0);
        assert_eq!(v[9], 0.0);
        // But the pairs before it are populated (cos of anything is non-zero
        // for these positions).
        assert!(v[1] != 0.0);
        assert!(v[6] != 0.0);
    }

    #[test]
    fn test_values_bounded() {
        let p = positions(&(0..12).collect::<Vec<i32>>(), 3, 4);
        let e = sin_embedding(&p, 16, 10_000.0, DType::F32).unwrap();
        assert!(e.as_f32_slice().iter().all(|&v| (-1.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_rejects_rank_1() {
        let p = Tensor::from_i32(Shape::vector(3), &[0, 1, 2], Device::Cpu).unwrap();
        let err = sin_embedding(&p, 4, 10_000.0, DType::F32).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Tensor(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_i32_output() {
        let p = positions(&[0], 1, 1);
        let err = sin_embedding(&p, 4, 10_000.0, DType::I32).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Tensor(TensorError::UnsupportedDType { .. })
        ));
    }
}
