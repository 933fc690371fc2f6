// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Device placement tags.

/// Identifies where a tensor's buffer logically lives.
///
/// The tag is carried through every operation (from the left-hand input)
/// but does not change execution: all kernels run on the CPU. It exists so
/// that callers moving tensors across a process or network boundary can
/// round-trip the intended placement.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Host memory (the default).
    #[default]
    Cpu,
    /// Accelerator memory. Placement intent only; no kernels dispatch on it.
    Gpu,
}

impl Device {
    /// Returns a human-readable label for this device.
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Gpu => "gpu",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
