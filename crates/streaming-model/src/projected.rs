// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The projected transformer: width adaptation and layout conversion
//! around the streaming shell.
//!
//! ```text
//! x (B,C,T if channel-first)
//!     │ transpose (1,2)            — channel-first only
//!     ▼
//! input projection                 — only if input_width != model_width
//!     ▼
//! streaming transformer shell
//!     ▼
//! one output projection per configured width (identity at model_width)
//!     │ transpose (1,2) back       — channel-first only
//!     ▼
//! Vec<Tensor>, one per output width, order preserved
//! ```

use crate::{Layout, ModelError, ProjectedConfig, StreamingState, StreamingTransformer};
use crate::unit::LayerUnit;
use tensor_core::{ops, DType, Shape, Tensor};

/// A dense linear map over the last axis, with deferred parameters.
///
/// Projections are constructed *uninitialized*: their weights typically
/// arrive later from whatever loader the surrounding application uses.
/// Calling [`forward`](Linear::forward) before
/// [`set_parameters`](Linear::set_parameters) fails with
/// [`ModelError::Uninitialized`].
#[derive(Debug, Clone)]
pub struct Linear {
    name: String,
    in_features: usize,
    out_features: usize,
    params: Option<LinearParams>,
}

#[derive(Debug, Clone)]
struct LinearParams {
    weight: Tensor,
    bias: Option<Tensor>,
}

impl Linear {
    /// Creates an uninitialized projection.
    pub fn new(name: impl Into<String>, in_features: usize, out_features: usize) -> Self {
        Self {
            name: name.into(),
            in_features,
            out_features,
            params: None,
        }
    }

    /// Creates a projection with all-zero parameters.
    pub fn zeroed(
        name: impl Into<String>,
        in_features: usize,
        out_features: usize,
        use_bias: bool,
        dtype: DType,
    ) -> Result<Self, ModelError> {
        let mut linear = Self::new(name, in_features, out_features);
        let weight = Tensor::zeros(
            Shape::matrix(out_features, in_features),
            dtype,
            Default::default(),
        )?;
        let bias = if use_bias {
            Some(Tensor::zeros(
                Shape::vector(out_features),
                dtype,
                Default::default(),
            )?)
        } else {
            None
        };
        linear.set_parameters(weight, bias)?;
        Ok(linear)
    }

    /// Installs the weight (`[out_features, in_features]`) and optional
    /// bias (`[out_features]`).
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidConfiguration`] when the shapes do
    /// not match this projection's widths.
    pub fn set_parameters(
        &mut self,
        weight: Tensor,
        bias: Option<Tensor>,
    ) -> Result<(), ModelError> {
        let expected = Shape::matrix(self.out_features, self.in_features);
        if weight.shape() != &expected {
            return Err(ModelError::InvalidConfiguration(format!(
                "projection '{}' expects weight {expected}, got {}",
                self.name,
                weight.shape(),
            )));
        }
        if let Some(b) = &bias {
            let expected = Shape::vector(self.out_features);
            if b.shape() != &expected {
                return Err(ModelError::InvalidConfiguration(format!(
                    "projection '{}' expects bias {expected}, got {}",
                    self.name,
                    b.shape(),
                )));
            }
        }
        self.params = Some(LinearParams { weight, bias });
        Ok(())
    }

    /// Returns `true` once parameters are installed.
    pub fn is_initialized(&self) -> bool {
        self.params.is_some()
    }

    /// Input feature width.
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Output feature width.
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// Applies the projection over the last axis.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor, ModelError> {
        let params = self.params.as_ref().ok_or_else(|| ModelError::Uninitialized {
            component: self.name.clone(),
        })?;
        Ok(ops::linear(x, &params.weight, params.bias.as_ref())?)
    }
}

/// One output head of the projected transformer.
#[derive(Debug, Clone)]
pub enum Projection {
    /// The requested width equals the model width: pass through.
    Identity,
    /// A dense map to the requested width.
    Linear(Linear),
}

impl Projection {
    fn forward(&self, x: &Tensor) -> Result<Tensor, ModelError> {
        match self {
            Projection::Identity => Ok(x.clone()),
            Projection::Linear(linear) => linear.forward(x),
        }
    }

    fn is_initialized(&self) -> bool {
        match self {
            Projection::Identity => true,
            Projection::Linear(linear) => linear.is_initialized(),
        }
    }

    /// Human-readable description for inspection output.
    pub fn describe(&self) -> String {
        match self {
            Projection::Identity => "identity".to_string(),
            Projection::Linear(l) => format!(
                "linear {} -> {}{}",
                l.in_features(),
                l.out_features(),
                if l.is_initialized() { "" } else { " (uninitialized)" },
            ),
        }
    }
}

/// Wraps a [`StreamingTransformer`] with width adaptation and layout
/// conversion.
pub struct ProjectedTransformer {
    config: ProjectedConfig,
    layout: Layout,
    input_proj: Option<Linear>,
    output_projs: Vec<Projection>,
    shell: StreamingTransformer,
}

impl ProjectedTransformer {
    /// Builds the wrapper: an input projection only when
    /// `input_width != model_width`, and one output projection per
    /// requested width (identity at `model_width`).
    ///
    /// All configuration is validated here; nothing fails at first use
    /// except the documented [`ModelError::Uninitialized`] for
    /// projections whose parameters have not arrived yet.
    pub fn new(
        config: ProjectedConfig,
        units: Vec<Box<dyn LayerUnit>>,
    ) -> Result<Self, ModelError> {
        config.validate()?;
        let layout = config.layout_kind()?;
        let shell = StreamingTransformer::new(config.shell.clone(), units)?;

        let model_width = config.shell.model_width;
        let input_proj = (config.input_width != model_width)
            .then(|| Linear::new("input_proj", config.input_width, model_width));
        let output_projs = config
            .output_widths
            .iter()
            .enumerate()
            .map(|(i, &width)| {
                if width == model_width {
                    Projection::Identity
                } else {
                    Projection::Linear(Linear::new(
                        format!("output_proj.{i}"),
                        model_width,
                        width,
                    ))
                }
            })
            .collect();

        tracing::info!(
            "projected transformer: {} -> {} -> {:?}, layout '{layout}'",
            config.input_width,
            model_width,
            config.output_widths,
        );
        Ok(Self {
            config,
            layout,
            input_proj,
            output_projs,
            shell,
        })
    }

    /// Returns the wrapper's configuration.
    pub fn config(&self) -> &ProjectedConfig {
        &self.config
    }

    /// Returns the wrapped shell.
    pub fn shell(&self) -> &StreamingTransformer {
        &self.shell
    }

    /// Returns the input projection, if one was derived.
    pub fn input_projection(&self) -> Option<&Linear> {
        self.input_proj.as_ref()
    }

    /// Returns the output projections, one per configured width.
    pub fn output_projections(&self) -> &[Projection] {
        &self.output_projs
    }

    /// Creates a streaming state for `batch_size` sequences.
    pub fn streaming_state(&self, batch_size: usize) -> Result<StreamingState, ModelError> {
        self.shell.streaming_state(batch_size)
    }

    /// Returns `true` once every derived projection has parameters.
    pub fn is_initialized(&self) -> bool {
        self.input_proj.as_ref().map_or(true, Linear::is_initialized)
            && self.output_projs.iter().all(Projection::is_initialized)
    }

    /// Installs parameters for the input projection.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidConfiguration`] if no input
    /// projection was derived (widths already match) or the shapes are
    /// wrong.
    pub fn load_input_parameters(
        &mut self,
        weight: Tensor,
        bias: Option<Tensor>,
    ) -> Result<(), ModelError> {
        match &mut self.input_proj {
            Some(proj) => proj.set_parameters(weight, bias),
            None => Err(ModelError::InvalidConfiguration(
                "input width equals model width; there is no input projection".into(),
            )),
        }
    }

    /// Installs parameters for the output projection at `index`.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidConfiguration`] for an
    /// out-of-range index, an identity head, or wrong shapes.
    pub fn load_output_parameters(
        &mut self,
        index: usize,
        weight: Tensor,
        bias: Option<Tensor>,
    ) -> Result<(), ModelError> {
        let count = self.output_projs.len();
        match self.output_projs.get_mut(index) {
            Some(Projection::Linear(proj)) => proj.set_parameters(weight, bias),
            Some(Projection::Identity) => Err(ModelError::InvalidConfiguration(format!(
                "output projection {index} is an identity head; it takes no parameters"
            ))),
            None => Err(ModelError::InvalidConfiguration(format!(
                "output projection index {index} out of range ({count} heads)"
            ))),
        }
    }

    /// Zero-fills every derived projection's parameters.
    ///
    /// Bias presence follows the configuration's `bias` flag. Intended
    /// for demos and tests that only exercise shape flow.
    pub fn init_zeroed(&mut self, dtype: DType) -> Result<(), ModelError> {
        let use_bias = self.config.bias;
        if let Some(proj) = &mut self.input_proj {
            let (in_f, out_f) = (proj.in_features(), proj.out_features());
            *proj = Linear::zeroed("input_proj", in_f, out_f, use_bias, dtype)?;
        }
        for (i, head) in self.output_projs.iter_mut().enumerate() {
            if let Projection::Linear(proj) = head {
                let (in_f, out_f) = (proj.in_features(), proj.out_features());
                *proj = Linear::zeroed(format!("output_proj.{i}"), in_f, out_f, use_bias, dtype)?;
            }
        }
        Ok(())
    }

    /// Runs one forward chunk through projection, shell, and the output
    /// heads.
    ///
    /// Returns one tensor per configured output width, in configuration
    /// order. With the channel-first layout, `x` is `(B, C, T)` and so
    /// is every output; internally everything runs sequence-first.
    pub fn forward(
        &self,
        x: &Tensor,
        state: Option<&mut StreamingState>,
    ) -> Result<Vec<Tensor>, ModelError> {
        let x = match self.layout {
            Layout::ChannelFirst => ops::transpose(x, 1, 2)?,
            Layout::SequenceFirst => x.clone(),
        };

        let x = match &self.input_proj {
            Some(proj) => proj.forward(&x)?,
            None => x,
        };

        let hidden = self.shell.forward(&x, state)?;

        let mut outputs = Vec::with_capacity(self.output_projs.len());
        for head in &self.output_projs {
            let y = head.forward(&hidden)?;
            let y = match self.layout {
                Layout::ChannelFirst => ops::transpose(&y, 1, 2)?,
                Layout::SequenceFirst => y,
            };
            outputs.push(y);
        }
        Ok(outputs)
    }
}

impl std::fmt::Debug for ProjectedTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectedTransformer")
            .field("input_width", &self.config.input_width)
            .field("output_widths", &self.config.output_widths)
            .field("layout", &self.layout)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{unit_stack, ShellConfig};
    use tensor_core::Device;

    fn projected(
        input_width: usize,
        output_widths: Vec<usize>,
        model_width: usize,
        layout: &str,
    ) -> ProjectedTransformer {
        let config = ProjectedConfig {
            input_width,
            output_widths,
            layout: layout.into(),
            bias: true,
            shell: ShellConfig {
                model_width,
                head_count: 1,
                layer_count: 2,
                feed_forward_widths: vec![model_width * 4],
                positional_embedding: "none".into(),
                ..Default::default()
            },
        };
        let units = unit_stack("identity", config.shell.layer_count).unwrap();
        ProjectedTransformer::new(config, units).unwrap()
    }

    #[test]
    fn test_projection_derivation() {
        let p = projected(6, vec![4, 8, 4], 4, "sequence-first");
        assert!(p.input_projection().is_some());
        assert!(matches!(p.output_projections()[0], Projection::Identity));
        assert!(matches!(p.output_projections()[1], Projection::Linear(_)));
        assert!(matches!(p.output_projections()[2], Projection::Identity));
    }

    #[test]
    fn test_no_input_projection_when_widths_match() {
        let p = projected(4, vec![4], 4, "sequence-first");
        assert!(p.input_projection().is_none());
        assert!(p.is_initialized()); // identity-only: nothing to install
    }

    #[test]
    fn test_uninitialized_forward_fails() {
        let p = projected(6, vec![4], 4, "sequence-first");
        assert!(!p.is_initialized());

        let x = Tensor::zeros(Shape::rank3(1, 2, 6), DType::F32, Device::Cpu).unwrap();
        let err = p.forward(&x, None).unwrap_err();
        assert!(matches!(err, ModelError::Uninitialized { .. }));
    }

    #[test]
    fn test_forward_output_shapes() {
        let mut p = projected(6, vec![4, 8], 4, "sequence-first");
        p.init_zeroed(DType::F32).unwrap();

        let x = Tensor::zeros(Shape::rank3(2, 3, 6), DType::F32, Device::Cpu).unwrap();
        let outputs = p.forward(&x, None).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].shape(), &Shape::rank3(2, 3, 4));
        assert_eq!(outputs[1].shape(), &Shape::rank3(2, 3, 8));
    }

    #[test]
    fn test_channel_first_round_trip() {
        let mut p = projected(64, vec![64], 64, "channel-first");
        p.init_zeroed(DType::F32).unwrap();

        // (B, C, T) in, (B, C, T) out.
        let x = Tensor::zeros(Shape::rank3(1, 64, 10), DType::F32, Device::Cpu).unwrap();
        let outputs = p.forward(&x, None).unwrap();
        assert_eq!(outputs[0].shape(), &Shape::rank3(1, 64, 10));
    }

    #[test]
    fn test_load_parameters_validation() {
        let mut p = projected(6, vec![4, 8], 4, "sequence-first");

        // Wrong weight shape for the input projection.
        let bad = Tensor::zeros(Shape::matrix(4, 5), DType::F32, Device::Cpu).unwrap();
        assert!(p.load_input_parameters(bad, None).is_err());

        let good = Tensor::zeros(Shape::matrix(4, 6), DType::F32, Device::Cpu).unwrap();
        p.load_input_parameters(good, None).unwrap();

        // Head 0 is identity: takes no parameters.
        let w = Tensor::zeros(Shape::matrix(8, 4), DType::F32, Device::Cpu).unwrap();
        assert!(p.load_output_parameters(0, w.clone(), None).is_err());
        p.load_output_parameters(1, w, None).unwrap();
        assert!(p.is_initialized());

        // Out-of-range head.
        let w = Tensor::zeros(Shape::matrix(8, 4), DType::F32, Device::Cpu).unwrap();
        assert!(p.load_output_parameters(5, w, None).is_err());
    }

    #[test]
    fn test_identity_head_passes_shell_output() {
        // Identity head + identity units + no positional: the output is
        // the input projected... with matching widths, exactly the input.
        let p = projected(4, vec![4], 4, "sequence-first");
        let x = Tensor::from_f32(
            Shape::rank3(1, 2, 4),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
            Device::Cpu,
        )
        .unwrap();
        let outputs = p.forward(&x, None).unwrap();
        assert_eq!(outputs[0].as_f32_slice(), x.as_f32_slice());
    }

    #[test]
    fn test_projection_values_with_real_weights() {
        // input_width 2 -> model_width 2 (no input proj), one head 2 -> 1
        // with weight [[1, 1]] and bias [10]: y = sum of channels + 10.
        let mut p = projected(2, vec![1], 2, "sequence-first");
        let w = Tensor::from_f32(Shape::matrix(1, 2), &[1.0, 1.0], Device::Cpu).unwrap();
        let b = Tensor::from_f32(Shape::vector(1), &[10.0], Device::Cpu).unwrap();
        p.load_output_parameters(0, w, Some(b)).unwrap();

        let x = Tensor::from_f32(Shape::rank3(1, 2, 2), &[1.0, 2.0, 3.0, 4.0], Device::Cpu)
            .unwrap();
        let outputs = p.forward(&x, None).unwrap();
        assert_eq!(outputs[0].shape(), &Shape::rank3(1, 2, 1));
        assert_eq!(outputs[0].as_f32_slice(), &[13.0, 17.0]);
    }

    #[test]
    fn test_forward_threads_state() {
        let mut p = projected(6, vec![4], 4, "sequence-first");
        p.init_zeroed(DType::F32).unwrap();

        let mut state = p.streaming_state(2).unwrap();
        let x = Tensor::zeros(Shape::rank3(2, 5, 6), DType::F32, Device::Cpu).unwrap();
        p.forward(&x, Some(&mut state)).unwrap();
        p.forward(&x, Some(&mut state)).unwrap();
        assert_eq!(state.offsets().as_i32_slice(), &[10, 10]);
    }
}
