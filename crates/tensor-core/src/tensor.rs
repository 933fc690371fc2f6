// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type and storage-sharing rules.

use crate::{DType, Device, Shape, TensorError};
use std::sync::Arc;

/// An n-dimensional tensor over a reference-counted flat buffer.
///
/// `Tensor` is the primary data carrier in the streaming pipeline.
/// Data is stored in row-major (C) order as a flat byte buffer; typed
/// access is provided via [`as_f32_slice`](Tensor::as_f32_slice) and
/// friends.
///
/// # Storage Aliasing
/// The buffer is held behind an [`Arc`], so [`crate::ops::reshape`] can
/// return a *view* sharing the original storage while every other
/// operation allocates fresh storage. `Clone` is cheap and also shares
/// storage. Mutable access goes through copy-on-write
/// ([`Arc::make_mut`]): if the buffer is shared, the data is cloned
/// first, so mutating one handle never alters another. Use
/// [`shares_storage`](Tensor::shares_storage) to observe the aliasing
/// relation.
#[derive(Debug, Clone)]
pub struct Tensor {
    shape: Shape,
    dtype: DType,
    device: Device,
    data: Arc<Vec<u8>>,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Errors
    /// Returns [`TensorError::InvalidShape`] if any dimension is zero.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape, DType, Device};
    /// let t = Tensor::zeros(Shape::matrix(2, 3), DType::F32, Device::Cpu).unwrap();
    /// assert_eq!(t.size_bytes(), 24); // 2 * 3 * 4 bytes
    /// ```
    pub fn zeros(shape: Shape, dtype: DType, device: Device) -> Result<Self, TensorError> {
        if shape.dims().iter().any(|&d| d == 0) {
            return Err(TensorError::InvalidShape {
                dims: shape.dims().to_vec(),
            });
        }
        let size = shape.size_bytes(dtype);
        Ok(Self {
            shape,
            dtype,
            device,
            data: Arc::new(vec![0u8; size]),
        })
    }

    /// Creates a 1-D tensor with `ceil((stop - start) / step)` elements,
    /// where `element[i] = start + i * step` cast to `dtype`.
    ///
    /// An empty or inverted range yields a zero-length tensor.
    ///
    /// # Errors
    /// Returns [`TensorError::InvalidRange`] if `step == 0`.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, DType, Device};
    /// let t = Tensor::arange(0.0, 5.0, 2.0, DType::I32, Device::Cpu).unwrap();
    /// assert_eq!(t.as_i32_slice(), &[0, 2, 4]);
    /// ```
    pub fn arange(
        start: f64,
        stop: f64,
        step: f64,
        dtype: DType,
        device: Device,
    ) -> Result<Self, TensorError> {
        if step == 0.0 {
            return Err(TensorError::InvalidRange { start, stop });
        }
        let count = ((stop - start) / step).ceil();
        let count = if count > 0.0 { count as usize } else { 0 };
        let values: Vec<f64> = (0..count).map(|i| start + i as f64 * step).collect();

        let data = match dtype {
            DType::F32 => bytes_of(&values.iter().map(|&v| v as f32).collect::<Vec<f32>>()),
            DType::F64 => bytes_of(&values),
            DType::I32 => bytes_of(&values.iter().map(|&v| v as i32).collect::<Vec<i32>>()),
        };
        Ok(Self {
            shape: Shape::vector(count),
            dtype,
            device,
            data: Arc::new(data),
        })
    }

    /// Creates a tensor from a slice of `f32` values.
    ///
    /// # Errors
    /// Returns [`TensorError::BufferSizeMismatch`] if the value count
    /// does not match the shape.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape, Device};
    /// let t = Tensor::from_f32(Shape::vector(3), &[1.0, 2.0, 3.0], Device::Cpu).unwrap();
    /// assert_eq!(t.as_f32_slice(), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn from_f32(shape: Shape, values: &[f32], device: Device) -> Result<Self, TensorError> {
        Self::from_typed(shape, DType::F32, values, device)
    }

    /// Creates a tensor from a slice of `f64` values.
    pub fn from_f64(shape: Shape, values: &[f64], device: Device) -> Result<Self, TensorError> {
        Self::from_typed(shape, DType::F64, values, device)
    }

    /// Creates a tensor from a slice of `i32` values.
    pub fn from_i32(shape: Shape, values: &[i32], device: Device) -> Result<Self, TensorError> {
        Self::from_typed(shape, DType::I32, values, device)
    }

    fn from_typed<T: Copy>(
        shape: Shape,
        dtype: DType,
        values: &[T],
        device: Device,
    ) -> Result<Self, TensorError> {
        let expected = shape.num_elements();
        if values.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected: expected * dtype.size_bytes(),
                actual: values.len() * dtype.size_bytes(),
            });
        }
        Ok(Self {
            shape,
            dtype,
            device,
            data: Arc::new(bytes_of(values)),
        })
    }

    /// Builds a tensor directly from a raw byte buffer.
    ///
    /// Used by operations that have already produced a correctly sized
    /// buffer; the size invariant is checked in debug builds only.
    pub(crate) fn from_raw(shape: Shape, dtype: DType, device: Device, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), shape.size_bytes(dtype));
        Self {
            shape,
            dtype,
            device,
            data: Arc::new(data),
        }
    }

    /// Returns a tensor with a different shape over the *same* storage.
    ///
    /// This is the aliasing primitive behind [`crate::ops::reshape`].
    pub(crate) fn with_shape(&self, shape: Shape) -> Self {
        debug_assert_eq!(shape.num_elements(), self.shape.num_elements());
        Self {
            shape,
            dtype: self.dtype,
            device: self.device,
            data: Arc::clone(&self.data),
        }
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the tensor's device tag.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Returns the total number of elements.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Returns the memory footprint of this tensor in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Returns the raw byte slice backing this tensor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns `true` if `self` and `other` share the same underlying
    /// buffer (i.e., one is a reshape view or clone of the other).
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Interprets the buffer as a slice of `f32`.
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::F32`.
    pub fn as_f32_slice(&self) -> &[f32] {
        assert_eq!(
            self.dtype,
            DType::F32,
            "as_f32_slice called on {} tensor",
            self.dtype
        );
        // SAFETY: the buffer was constructed from f32 values of exactly
        // num_elements() length.
        unsafe {
            std::slice::from_raw_parts(self.data.as_ptr() as *const f32, self.num_elements())
        }
    }

    /// Interprets the buffer as a slice of `f64`.
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::F64`.
    pub fn as_f64_slice(&self) -> &[f64] {
        assert_eq!(
            self.dtype,
            DType::F64,
            "as_f64_slice called on {} tensor",
            self.dtype
        );
        // SAFETY: constructed from f64 values of exactly num_elements() length.
        unsafe {
            std::slice::from_raw_parts(self.data.as_ptr() as *const f64, self.num_elements())
        }
    }

    /// Interprets the buffer as a slice of `i32`.
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::I32`.
    pub fn as_i32_slice(&self) -> &[i32] {
        assert_eq!(
            self.dtype,
            DType::I32,
            "as_i32_slice called on {} tensor",
            self.dtype
        );
        // SAFETY: constructed from i32 values of exactly num_elements() length.
        unsafe {
            std::slice::from_raw_parts(self.data.as_ptr() as *const i32, self.num_elements())
        }
    }

    /// Interprets the buffer as a mutable slice of `i32`.
    ///
    /// Copy-on-write: if the buffer is shared with another tensor, the
    /// data is cloned first, so the mutation never alters an alias.
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::I32`.
    pub fn as_i32_slice_mut(&mut self) -> &mut [i32] {
        assert_eq!(
            self.dtype,
            DType::I32,
            "as_i32_slice_mut called on {} tensor",
            self.dtype
        );
        let n = self.num_elements();
        let data = Arc::make_mut(&mut self.data);
        // SAFETY: constructed from i32 values of exactly n length.
        unsafe { std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut i32, n) }
    }

    /// Interprets the buffer as a mutable slice of `f32` (copy-on-write,
    /// like [`as_i32_slice_mut`](Tensor::as_i32_slice_mut)).
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::F32`.
    pub fn as_f32_slice_mut(&mut self) -> &mut [f32] {
        assert_eq!(
            self.dtype,
            DType::F32,
            "as_f32_slice_mut called on {} tensor",
            self.dtype
        );
        let n = self.num_elements();
        let data = Arc::make_mut(&mut self.data);
        // SAFETY: constructed from f32 values of exactly n length.
        unsafe { std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut f32, n) }
    }

    /// Reads every element as `f64` regardless of dtype.
    ///
    /// Intended for small index/position tensors; allocates.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self.dtype {
            DType::F32 => self.as_f32_slice().iter().map(|&v| v as f64).collect(),
            DType::F64 => self.as_f64_slice().to_vec(),
            DType::I32 => self.as_i32_slice().iter().map(|&v| v as f64).collect(),
        }
    }
}

/// Reinterprets a typed slice as its little-endian byte image.
fn bytes_of<T: Copy>(values: &[T]) -> Vec<u8> {
    // SAFETY: reinterpreting &[T] as &[u8] is safe for Copy types.
    let bytes = unsafe {
        std::slice::from_raw_parts(values.as_ptr() as *const u8, std::mem::size_of_val(values))
    };
    bytes.to_vec()
}
