// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Minimal tensor values and shape-manipulation primitives for the
//! streaming transformer engine.
//!
//! This crate provides:
//! - [`Tensor`] — an n-dimensional value over a reference-counted flat
//!   buffer, with zero-fill, integer-range, and typed-slice construction.
//! - [`Shape`] — runtime shape descriptors with row-major strides.
//! - [`DType`] — supported element types (f32, f64, i32).
//! - [`Device`] — a cpu/gpu placement tag carried through operations.
//! - [`ops`] — pure operations: reshape (storage-sharing view), rank-3
//!   transpose (always a copy), exact-shape elementwise add, scalar
//!   scale, and a dense last-axis linear projection.
//!
//! # Design Goals
//! - Value semantics: operations return new tensors; the only aliasing
//!   is the documented reshape view, and mutation is copy-on-write.
//! - No broadcasting beyond the documented cases; shape errors fail
//!   fast with typed errors via `thiserror`.
//! - No hidden state: everything is a pure function of its inputs.

mod device;
mod dtype;
mod error;
pub mod ops;
mod shape;
mod tensor;

pub use device::Device;
pub use dtype::DType;
pub use error::TensorError;
pub use shape::Shape;
pub use tensor::Tensor;
