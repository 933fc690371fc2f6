// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pluggable per-layer compute units.
//!
//! The shell treats each layer as an opaque capability: a
//! shape-preserving transformation over `[batch, time, channel]`
//! tensors. What happens inside — self-attention with causal masking up
//! to the context window, a feed-forward block, rotary embeddings — is
//! the unit's business, supplied by the surrounding application. The
//! shell only enforces the shape contract around it.

use crate::ModelError;
use tensor_core::Tensor;

/// A single layer's computation.
///
/// Implementations must preserve the input shape: the shell checks
/// every unit's output against its input and fails the forward call if
/// a unit breaks the contract.
///
/// Units are purely algorithmic — no I/O, no interior mutability
/// needed — making them trivially unit-testable.
pub trait LayerUnit: Send + Sync {
    /// Human-readable name of this unit (used in error and log context).
    fn name(&self) -> &str;

    /// Transforms a `[batch, time, channel]` tensor into one of the
    /// same shape.
    fn forward(&self, x: &Tensor) -> Result<Tensor, ModelError>;
}

/// A pass-through unit: returns its input unchanged.
///
/// Useful as a placeholder while the real attention/feed-forward units
/// are supplied by the surrounding application, and for exercising the
/// shell's positional and offset bookkeeping in isolation.
#[derive(Debug, Default)]
pub struct IdentityUnit;

impl LayerUnit for IdentityUnit {
    fn name(&self) -> &str {
        "identity"
    }

    fn forward(&self, x: &Tensor) -> Result<Tensor, ModelError> {
        Ok(x.clone())
    }
}

/// Builds a homogeneous stack of `layer_count` units from a config
/// string.
///
/// # Errors
/// Returns [`ModelError::InvalidConfiguration`] for an unknown kind.
pub fn unit_stack(kind: &str, layer_count: usize) -> Result<Vec<Box<dyn LayerUnit>>, ModelError> {
    match kind.to_lowercase().as_str() {
        "identity" | "passthrough" => Ok((0..layer_count)
            .map(|_| Box::new(IdentityUnit) as Box<dyn LayerUnit>)
            .collect()),
        other => Err(ModelError::InvalidConfiguration(format!(
            "unknown layer unit '{other}'; expected 'identity'"
        ))),
    }
}
