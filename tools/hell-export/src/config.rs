//! Export options

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{ExportError, ExportResult};

/// Default decimal places used to quantize positions and UVs for welding
pub const DEFAULT_ROUNDING: i32 = 6;

/// Default minimum cosine between normals for two loops to share a vertex
pub const DEFAULT_NORMAL_THRESHOLD: f32 = 0.95;

/// Which scene objects take part in an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// Every visible object in the scene
    #[default]
    AllVisible,
    /// Only visible objects that are currently selected
    SelectedOnly,
}

impl SelectionMode {
    pub fn describe(self) -> &'static str {
        match self {
            SelectionMode::AllVisible => "scene",
            SelectionMode::SelectedOnly => "selection",
        }
    }
}

/// Options for one export run
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub output: PathBuf,
    /// Decimal places for the weld key (may be negative: -1 rounds to tens)
    pub rounding: i32,
    pub selection: SelectionMode,
    /// Uniform scale applied to positions and translations
    pub scale: f32,
    pub include_non_deforming: bool,
    pub normal_threshold: f32,
    /// Write zero bounds instead of the +inf/-inf sentinel for meshes without vertices
    pub zero_empty_bounds: bool,
}

impl ExportOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            rounding: DEFAULT_ROUNDING,
            selection: SelectionMode::AllVisible,
            scale: 1.0,
            include_non_deforming: true,
            normal_threshold: DEFAULT_NORMAL_THRESHOLD,
            zero_empty_bounds: false,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rounding(mut self, rounding: i32) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_selection(mut self, selection: SelectionMode) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_include_non_deforming(mut self, include: bool) -> Self {
        self.include_non_deforming = include;
        self
    }

    pub fn with_normal_threshold(mut self, threshold: f32) -> Self {
        self.normal_threshold = threshold;
        self
    }

    pub fn with_zero_empty_bounds(mut self, zero: bool) -> Self {
        self.zero_empty_bounds = zero;
        self
    }

    /// Check option ranges
    pub fn validate(&self) -> ExportResult<()> {
        if self.output.as_os_str().is_empty() {
            return Err(ExportError::InvalidOption(
                "output path is required".to_string(),
            ));
        }
        if !(-9..=9).contains(&self.rounding) {
            return Err(ExportError::InvalidOption(format!(
                "rounding {} out of range (-9..=9)",
                self.rounding
            )));
        }
        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(ExportError::InvalidOption(format!(
                "scale must be finite and non-zero, got {}",
                self.scale
            )));
        }
        if !(-1.0..=1.0).contains(&self.normal_threshold) {
            return Err(ExportError::InvalidOption(format!(
                "normal threshold {} out of range (-1..=1)",
                self.normal_threshold
            )));
        }
        Ok(())
    }
}
