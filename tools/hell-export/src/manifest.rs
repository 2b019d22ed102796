//! hell.toml manifest parsing and batch builds
//!
//! ```toml
//! [defaults]
//! output_dir = "build/models"
//! scale = 0.01
//!
//! [[models]]
//! input = "art/crate.gltf"
//!
//! [[models]]
//! input = "art/hero.glb"
//! output = "hero.model"
//! select = ["Body", "Armature0"]
//! include_non_deforming = false
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hashbrown::HashSet;
use serde::Deserialize;

use crate::config::{ExportOptions, SelectionMode};
use crate::export::{export_scene, ExportSummary};
use crate::formats::MODEL_EXT;
use crate::scene::GltfScene;

/// Default manifest file name
pub const MANIFEST_NAME: &str = "hell.toml";

/// Export options that a manifest may set; unset fields keep the outer value
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OptionOverrides {
    pub scale: Option<f32>,
    pub rounding: Option<i32>,
    pub include_non_deforming: Option<bool>,
    pub normal_threshold: Option<f32>,
    pub zero_empty_bounds: Option<bool>,
}

impl OptionOverrides {
    pub fn apply(&self, mut options: ExportOptions) -> ExportOptions {
        if let Some(scale) = self.scale {
            options.scale = scale;
        }
        if let Some(rounding) = self.rounding {
            options.rounding = rounding;
        }
        if let Some(include) = self.include_non_deforming {
            options.include_non_deforming = include;
        }
        if let Some(threshold) = self.normal_threshold {
            options.normal_threshold = threshold;
        }
        if let Some(zero) = self.zero_empty_bounds {
            options.zero_empty_bounds = zero;
        }
        options
    }
}

/// `[defaults]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Defaults {
    /// Directory for outputs, relative to the manifest
    pub output_dir: Option<PathBuf>,
    #[serde(flatten)]
    pub options: OptionOverrides,
}

/// One `[[models]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    /// Source scene (.gltf / .glb), relative to the manifest
    pub input: PathBuf,
    /// Output file name, relative to the output directory.
    /// Default: input file stem + `.model`
    pub output: Option<PathBuf>,
    /// Export only these objects (selected-only mode)
    #[serde(default)]
    pub select: Vec<String>,
    #[serde(flatten)]
    pub overrides: OptionOverrides,
}

impl ModelEntry {
    fn output_name(&self) -> Result<PathBuf> {
        if let Some(output) = &self.output {
            return Ok(output.clone());
        }
        let stem = self
            .input
            .file_stem()
            .with_context(|| format!("Input {} has no file name", self.input.display()))?;
        Ok(PathBuf::from(stem).with_extension(MODEL_EXT))
    }
}

/// Parsed hell.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// A manifest entry resolved against the manifest directory
#[derive(Debug, Clone, PartialEq)]
pub struct BuildJob {
    pub input: PathBuf,
    pub select: Vec<String>,
    pub options: ExportOptions,
}

impl Manifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse hell.toml")
    }

    /// Resolve every entry into an export job.
    ///
    /// `base_dir` is the manifest's directory; `output_dir` overrides `[defaults] output_dir`.
    pub fn jobs(&self, base_dir: &Path, output_dir: Option<&Path>) -> Result<Vec<BuildJob>> {
        let out_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => match &self.defaults.output_dir {
                Some(dir) => base_dir.join(dir),
                None => base_dir.to_path_buf(),
            },
        };

        self.models
            .iter()
            .map(|entry| {
                let mut options = ExportOptions::new(out_dir.join(entry.output_name()?));
                options = self.defaults.options.apply(options);
                options = entry.overrides.apply(options);
                if !entry.select.is_empty() {
                    options.selection = SelectionMode::SelectedOnly;
                }
                Ok(BuildJob {
                    input: base_dir.join(&entry.input),
                    select: entry.select.clone(),
                    options,
                })
            })
            .collect()
    }

    /// Validate entries without touching any input file
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            anyhow::bail!("hell.toml declares no [[models]]");
        }

        let jobs = self.jobs(Path::new(""), None)?;
        let mut outputs = HashSet::new();
        for job in &jobs {
            job.options
                .validate()
                .with_context(|| format!("Invalid options for {}", job.input.display()))?;
            if !outputs.insert(job.options.output.clone()) {
                anyhow::bail!(
                    "Output {} is written by more than one model",
                    job.options.output.display()
                );
            }
        }
        Ok(())
    }

    /// Validate, then check that every input exists
    pub fn check(&self, base_dir: &Path) -> Result<Vec<BuildJob>> {
        self.validate()?;
        let jobs = self.jobs(base_dir, None)?;
        for job in &jobs {
            if !job.input.is_file() {
                anyhow::bail!("Input not found: {}", job.input.display());
            }
        }
        Ok(jobs)
    }

    /// Export every model, creating output directories as needed
    pub fn build(&self, base_dir: &Path, output_dir: Option<&Path>) -> Result<Vec<ExportSummary>> {
        self.validate()?;
        let mut summaries = Vec::with_capacity(self.models.len());
        for job in self.jobs(base_dir, output_dir)? {
            summaries.push(run_job(&job)?);
        }
        Ok(summaries)
    }
}

/// Load a job's scene and export it
pub fn run_job(job: &BuildJob) -> Result<ExportSummary> {
    if let Some(parent) = job.options.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let mut scene = GltfScene::load(&job.input)?;
    if !job.select.is_empty() {
        scene = scene.with_selection(&job.select)?;
    }

    tracing::info!(
        "Converting {} -> {}",
        job.input.display(),
        job.options.output.display()
    );
    export_scene(&scene, &job.options)
        .with_context(|| format!("Failed to export {}", job.input.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_minimal() {
        let manifest = Manifest::parse(
            r#"
[[models]]
input = "art/crate.gltf"
"#,
        )
        .unwrap();

        assert_eq!(manifest.models.len(), 1);
        assert!(manifest.defaults.output_dir.is_none());
        manifest.validate().unwrap();

        let jobs = manifest.jobs(Path::new("proj"), None).unwrap();
        assert_eq!(jobs[0].input, Path::new("proj/art/crate.gltf"));
        assert_eq!(jobs[0].options.output, Path::new("proj/crate.model"));
        assert_eq!(jobs[0].options.selection, SelectionMode::AllVisible);
        assert_eq!(jobs[0].options.scale, 1.0);
    }

    #[test]
    fn test_defaults_and_overrides() {
        let manifest = Manifest::parse(
            r#"
[defaults]
output_dir = "out"
scale = 0.01
rounding = 4

[[models]]
input = "hero.glb"
output = "characters/hero.model"
select = ["Body"]
scale = 2.0
include_non_deforming = false
"#,
        )
        .unwrap();

        let jobs = manifest.jobs(Path::new("p"), None).unwrap();
        let job = &jobs[0];
        assert_eq!(job.options.output, Path::new("p/out/characters/hero.model"));
        assert_eq!(job.options.scale, 2.0);
        assert_eq!(job.options.rounding, 4);
        assert!(!job.options.include_non_deforming);
        assert_eq!(job.options.selection, SelectionMode::SelectedOnly);
        assert_eq!(job.select, vec!["Body".to_string()]);

        // Command-line output directory wins
        let jobs = manifest.jobs(Path::new("p"), Some(Path::new("dist"))).unwrap();
        assert_eq!(jobs[0].options.output, Path::new("dist/characters/hero.model"));
    }

    #[test]
    fn test_validate_rejects_bad_manifests() {
        assert!(Manifest::parse("").unwrap().validate().is_err());

        let bad_scale = Manifest::parse(
            r#"
[[models]]
input = "a.gltf"
scale = 0.0
"#,
        )
        .unwrap();
        assert!(bad_scale.validate().is_err());

        let duplicate = Manifest::parse(
            r#"
[[models]]
input = "a/thing.gltf"

[[models]]
input = "b/thing.glb"
"#,
        )
        .unwrap();
        let err = duplicate.validate().unwrap_err();
        assert!(err.to_string().contains("more than one model"));
    }

    #[test]
    fn test_parse_error_has_context() {
        let err = Manifest::parse("[[models]]\ninput = 3").unwrap_err();
        assert!(err.to_string().contains("hell.toml"));
    }

    #[test]
    fn test_check_reports_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::parse(
            r#"
[[models]]
input = "missing.gltf"
"#,
        )
        .unwrap();
        let err = manifest.check(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Input not found"));
    }
}
