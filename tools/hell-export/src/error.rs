//! Export error taxonomy
//!
//! Input errors are raised before any byte reaches the output file.
//! Geometric and I/O errors can happen after the header has been written;
//! the partially written file is left on disk as-is.

use std::path::PathBuf;

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export: no visible meshes or armatures in the {0}")]
    EmptySelection(&'static str),

    #[error("object '{object}' is missing {what}")]
    MissingData { object: String, what: String },

    #[error("invalid export option: {0}")]
    InvalidOption(String),

    #[error("scene source error: {0}")]
    Scene(String),

    #[error("object '{object}' has a singular transform")]
    SingularTransform { object: String },

    #[error("bone '{bone}' of armature '{armature}' has a non-invertible rest matrix")]
    NonInvertibleRest { armature: String, bone: String },

    #[error("failed to create output {path:?}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write model data: {0}")]
    Write(#[from] std::io::Error),
}

impl ExportError {
    /// True for errors detected before the output file is opened
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptySelection(_)
                | Self::MissingData { .. }
                | Self::InvalidOption(_)
                | Self::Scene(_)
        )
    }

    pub(crate) fn missing(object: &str, what: impl Into<String>) -> Self {
        Self::MissingData {
            object: object.to_string(),
            what: what.into(),
        }
    }
}
