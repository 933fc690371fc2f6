// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the streaming model.

use tensor_core::TensorError;

/// Errors that can occur while building or running the streaming model.
///
/// Every variant signals a caller programming error; all failures are
/// immediate, synchronous, and non-retryable. Nothing is swallowed or
/// retried internally — the surrounding application decides how to
/// surface them.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A configuration value was rejected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Forward was invoked on a component whose parameters have not been
    /// installed yet (they typically arrive from an asynchronous loader
    /// owned by the surrounding application).
    #[error("component '{component}' used before its parameters were installed")]
    Uninitialized { component: String },

    /// A tensor operation failed inside a specific layer of the stack.
    #[error("execution error in layer '{layer}': {source}")]
    Layer {
        layer: String,
        #[source]
        source: TensorError,
    },

    /// A tensor operation failed outside the layer stack.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
