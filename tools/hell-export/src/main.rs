//! hell-export - Hell engine model export tool
//!
//! Converts glTF/GLB scenes to `.model` files, either one at a time or in
//! batches described by a hell.toml manifest.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use hell_common::ModelData;
use hell_export::{
    export_scene, ExportOptions, GltfScene, Manifest, SceneQuery, SelectionMode,
    DEFAULT_NORMAL_THRESHOLD, DEFAULT_ROUNDING, MANIFEST_NAME,
};

#[derive(Parser)]
#[command(name = "hell-export")]
#[command(about = "Hell engine model export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export one scene file
    Export {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Output .model file
        #[arg(short, long)]
        output: PathBuf,

        /// Uniform scale applied to positions and translations
        #[arg(long, default_value_t = 1.0)]
        scale: f32,

        /// Decimal places used when welding vertices
        #[arg(long, default_value_t = DEFAULT_ROUNDING, allow_hyphen_values = true)]
        rounding: i32,

        /// Export only these objects (repeatable)
        #[arg(long = "selected", value_name = "NAME")]
        selected: Vec<String>,

        /// Drop bones that do not deform any vertex
        #[arg(long)]
        deform_only: bool,

        /// Minimum normal cosine for two corners to share a vertex
        #[arg(long, default_value_t = DEFAULT_NORMAL_THRESHOLD, allow_hyphen_values = true)]
        normal_threshold: f32,

        /// Write zero bounds for meshes without triangles
        #[arg(long)]
        zero_empty_bounds: bool,
    },

    /// Build every model from a manifest file
    Build {
        /// Path to hell.toml manifest
        #[arg(default_value = MANIFEST_NAME)]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to hell.toml manifest
        #[arg(default_value = MANIFEST_NAME)]
        manifest: PathBuf,
    },

    /// Print the contents of a .model file
    Inspect {
        /// Model file to read
        file: PathBuf,
    },

    /// List the objects a scene file exposes
    List {
        /// Input glTF/GLB file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging; stdout is reserved for `inspect` / `list` output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            output,
            scale,
            rounding,
            selected,
            deform_only,
            normal_threshold,
            zero_empty_bounds,
        } => {
            let selection = if selected.is_empty() {
                SelectionMode::AllVisible
            } else {
                SelectionMode::SelectedOnly
            };
            let options = ExportOptions::new(output)
                .with_scale(scale)
                .with_rounding(rounding)
                .with_selection(selection)
                .with_include_non_deforming(!deform_only)
                .with_normal_threshold(normal_threshold)
                .with_zero_empty_bounds(zero_empty_bounds);

            let mut scene = GltfScene::load(&input)?;
            if !selected.is_empty() {
                scene = scene.with_selection(&selected)?;
            }
            export_scene(&scene, &options)
                .with_context(|| format!("Failed to export {}", input.display()))?;
        }

        Commands::Build { manifest, output } => {
            tracing::info!("Building models from {:?}", manifest);
            let config = Manifest::load(&manifest)?;
            let summaries = config.build(manifest_dir(&manifest), output.as_deref())?;
            tracing::info!("Build complete! {} models written", summaries.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = Manifest::load(&manifest)?;
            let jobs = config.check(manifest_dir(&manifest))?;
            tracing::info!("Manifest is valid! {} models", jobs.len());
        }

        Commands::Inspect { file } => inspect(&file)?,

        Commands::List { input } => {
            let scene = GltfScene::load(&input)?;
            for object in scene.objects() {
                let parent = object
                    .parent
                    .and_then(|p| scene.objects().get(p.index()))
                    .map(|p| p.name.as_str())
                    .unwrap_or("-");
                println!("{:?}\t{}\t(parent: {})", object.kind, object.name, parent);
            }
        }
    }

    Ok(())
}

fn manifest_dir(manifest: &Path) -> &Path {
    manifest.parent().unwrap_or(Path::new("."))
}

fn inspect(path: &Path) -> Result<()> {
    let model =
        ModelData::load(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let header = &model.header;

    println!("{}", path.display());
    println!(
        "  version {}, {} meshes, {} armatures, exported at {}",
        header.version,
        header.mesh_count,
        header.armature_count,
        chrono::DateTime::from_timestamp(header.timestamp as i64, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| header.timestamp.to_string())
    );
    println!(
        "  bounds {:?} .. {:?}",
        header.aabb_min.to_array(),
        header.aabb_max.to_array()
    );

    for (i, mesh) in model.meshes.iter().enumerate() {
        println!(
            "  mesh {} '{}': {} vertices, {} indices, parent {}",
            i,
            mesh.name,
            mesh.vertices.len(),
            mesh.indices.len(),
            mesh.parent_index
        );
    }
    for armature in &model.armatures {
        println!("  armature '{}': {} bones", armature.name, armature.bones.len());
        for (i, bone) in armature.bones.iter().enumerate() {
            println!(
                "    {} '{}' parent {}{}",
                i,
                bone.name,
                bone.parent_index,
                if bone.deform { "" } else { " (non-deforming)" }
            );
        }
    }
    Ok(())
}
