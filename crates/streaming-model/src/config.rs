// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! input_width = 64
//! output_widths = [64]
//! layout = "sequence-first"
//! bias = true
//!
//! [shell]
//! model_width = 512
//! head_count = 8
//! layer_count = 8
//! feed_forward_widths = [2048]
//! causal = true
//! context_window = 250
//! positional_embedding = "sin"
//! max_period = 10000.0
//! positional_scale = 1.0
//! ```
//!
//! Invalid values fail fast at construction of the model, never at the
//! first forward call.

use crate::ModelError;
use std::path::Path;

/// The positional-embedding scheme applied by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionalEmbedding {
    /// Fixed sinusoidal codes added to the input.
    Sin,
    /// Rotary embeddings; applied *inside* the installed layer units,
    /// the shell only validates the kind.
    Rope,
    /// Both: sinusoidal injection by the shell plus rotary in the units.
    SinRope,
    /// No positional information.
    None,
}

impl PositionalEmbedding {
    /// Parses an embedding kind from a config string.
    ///
    /// Accepts snake_case (`"sin_rope"`) and common aliases.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sin" | "sinusoidal" => Some(Self::Sin),
            "rope" | "rotary" => Some(Self::Rope),
            "sin_rope" | "sinrope" | "sin-rope" => Some(Self::SinRope),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }

    /// Returns `true` if the shell must inject sinusoidal codes.
    pub fn has_sinusoidal(self) -> bool {
        matches!(self, Self::Sin | Self::SinRope)
    }

    /// Returns a human-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Rope => "rope",
            Self::SinRope => "sin_rope",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for PositionalEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-ordering convention of the tensors a caller exchanges with the
/// projected transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// `(batch, time, channel)` — the shell's native layout.
    SequenceFirst,
    /// `(batch, channel, time)` — transposed at the boundary in both
    /// directions.
    ChannelFirst,
}

impl Layout {
    /// Parses a layout from a config string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sequence-first" | "sequence_first" | "seq-first" | "btc" => Some(Self::SequenceFirst),
            "channel-first" | "channel_first" | "chan-first" | "bct" => Some(Self::ChannelFirst),
            _ => None,
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SequenceFirst => "sequence-first",
            Self::ChannelFirst => "channel-first",
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the streaming transformer shell.
///
/// Immutable after construction of a [`crate::StreamingTransformer`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ShellConfig {
    /// Channel width the layer stack operates at.
    pub model_width: usize,
    /// Number of attention heads the installed units assume.
    pub head_count: usize,
    /// Number of layer units in the stack.
    pub layer_count: usize,
    /// Feed-forward width(s): one entry shared by every layer, or one
    /// entry per layer.
    pub feed_forward_widths: Vec<usize>,
    /// Whether the installed units should mask future positions.
    pub causal: bool,
    /// Attention span limit for the installed units, in positions.
    pub context_window: Option<usize>,
    /// Positional embedding kind: `"sin"`, `"rope"`, `"sin_rope"`, `"none"`.
    pub positional_embedding: String,
    /// Slowest sinusoid period.
    #[serde(default = "default_max_period")]
    pub max_period: f64,
    /// Multiplier applied to the positional codes before injection.
    #[serde(default = "default_positional_scale")]
    pub positional_scale: f64,
    /// Whether forward calls collect per-layer timing metrics.
    #[serde(default = "default_true")]
    pub enable_profiling: bool,
}

fn default_max_period() -> f64 {
    10_000.0
}

fn default_positional_scale() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl ShellConfig {
    /// Checks every field, returning the first violation.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.model_width == 0 {
            return Err(ModelError::InvalidConfiguration(
                "model_width must be positive".into(),
            ));
        }
        if self.head_count == 0 {
            return Err(ModelError::InvalidConfiguration(
                "head_count must be positive".into(),
            ));
        }
        if self.model_width % self.head_count != 0 {
            return Err(ModelError::InvalidConfiguration(format!(
                "model_width {} is not divisible by head_count {}",
                self.model_width, self.head_count
            )));
        }
        if self.layer_count == 0 {
            return Err(ModelError::InvalidConfiguration(
                "layer_count must be positive".into(),
            ));
        }
        if self.feed_forward_widths.is_empty()
            || (self.feed_forward_widths.len() != 1
                && self.feed_forward_widths.len() != self.layer_count)
        {
            return Err(ModelError::InvalidConfiguration(format!(
                "feed_forward_widths must hold 1 or {} entries, got {}",
                self.layer_count,
                self.feed_forward_widths.len()
            )));
        }
        if self.feed_forward_widths.iter().any(|&w| w == 0) {
            return Err(ModelError::InvalidConfiguration(
                "feed_forward_widths entries must be positive".into(),
            ));
        }
        if !(self.max_period.is_finite() && self.max_period > 0.0) {
            return Err(ModelError::InvalidConfiguration(format!(
                "max_period must be a positive finite number, got {}",
                self.max_period
            )));
        }
        if !self.positional_scale.is_finite() {
            return Err(ModelError::InvalidConfiguration(format!(
                "positional_scale must be finite, got {}",
                self.positional_scale
            )));
        }
        self.positional_kind().map(|_| ())
    }

    /// Parses the configured positional-embedding kind.
    pub fn positional_kind(&self) -> Result<PositionalEmbedding, ModelError> {
        PositionalEmbedding::from_str_loose(&self.positional_embedding).ok_or_else(|| {
            ModelError::InvalidConfiguration(format!(
                "unknown positional embedding '{}'; expected 'sin', 'rope', 'sin_rope', or 'none'",
                self.positional_embedding
            ))
        })
    }

    /// Feed-forward width for a specific layer.
    pub fn feed_forward_width(&self, layer: usize) -> usize {
        if self.feed_forward_widths.len() == 1 {
            self.feed_forward_widths[0]
        } else {
            self.feed_forward_widths[layer]
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            model_width: 512,
            head_count: 8,
            layer_count: 8,
            feed_forward_widths: vec![2048],
            causal: true,
            context_window: Some(250),
            positional_embedding: "sin".to_string(),
            max_period: default_max_period(),
            positional_scale: default_positional_scale(),
            enable_profiling: true,
        }
    }
}

/// Configuration for the projected transformer wrapper.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProjectedConfig {
    /// Channel width of the caller's input tensors.
    pub input_width: usize,
    /// One output tensor is produced per entry, at that channel width.
    pub output_widths: Vec<usize>,
    /// Axis layout at the boundary: `"sequence-first"` or `"channel-first"`.
    pub layout: String,
    /// Whether projections carry a per-output-feature bias.
    #[serde(default = "default_true")]
    pub bias: bool,
    /// The wrapped shell's configuration.
    pub shell: ShellConfig,
}

impl ProjectedConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ModelError::InvalidConfiguration(format!(
                "cannot read config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ModelError> {
        toml::from_str(toml_str)
            .map_err(|e| ModelError::InvalidConfiguration(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ModelError> {
        toml::to_string_pretty(self)
            .map_err(|e| ModelError::InvalidConfiguration(format!("TOML serialise error: {e}")))
    }

    /// Checks every field, including the nested shell configuration.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.input_width == 0 {
            return Err(ModelError::InvalidConfiguration(
                "input_width must be positive".into(),
            ));
        }
        if self.output_widths.iter().any(|&w| w == 0) {
            return Err(ModelError::InvalidConfiguration(
                "output_widths entries must be positive".into(),
            ));
        }
        self.layout_kind()?;
        self.shell.validate()
    }

    /// Parses the configured layout.
    pub fn layout_kind(&self) -> Result<Layout, ModelError> {
        Layout::from_str_loose(&self.layout).ok_or_else(|| {
            ModelError::InvalidConfiguration(format!(
                "unknown layout '{}'; expected 'sequence-first' or 'channel-first'",
                self.layout
            ))
        })
    }
}

impl Default for ProjectedConfig {
    fn default() -> Self {
        let shell = ShellConfig::default();
        Self {
            input_width: shell.model_width,
            output_widths: vec![shell.model_width],
            layout: "sequence-first".to_string(),
            bias: true,
            shell,
        }
    }
}
