use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use knownface_core::{Frame, FrameMatcher, Gallery, MatcherConfig, OnnxBackend};
use std::path::{Path, PathBuf};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "knownface", about = "Identify known faces in frames")]
struct Cli {
    /// Directory containing det_10g.onnx and w600k_r50.onnx
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a gallery and list its entries
    Gallery {
        /// Directory of reference face images, one person per file
        dir: PathBuf,
    },
    /// Label the faces in each image against a gallery
    Match {
        /// Directory of reference face images
        #[arg(short, long)]
        gallery: PathBuf,
        /// Detection downscale factor in (0, 1]
        #[arg(long)]
        resize_factor: Option<f64>,
        /// Distance cutoff for a positive match
        #[arg(long)]
        threshold: Option<f32>,
        /// Images to treat as video frames
        #[arg(required = true)]
        frames: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let model_dir = cli.model_dir.unwrap_or_else(|| config.model_dir.clone());

    let mut backend = OnnxBackend::load(&model_dir)
        .with_context(|| format!("loading models from {}", model_dir.display()))?;
    tracing::info!(dir = %model_dir.display(), "models loaded");

    match cli.command {
        Commands::Gallery { dir } => {
            let (gallery, report) = Gallery::load_with_report(&dir, &mut backend)?;
            println!("{} images found, {} loaded", report.images_found, report.loaded);
            for entry in gallery.entries() {
                println!("{}\t{}-dim", entry.label, entry.embedding.dim());
            }
            for skipped in &report.skipped {
                println!("skipped {}: {}", skipped.path.display(), skipped.reason);
            }
        }
        Commands::Match {
            gallery,
            resize_factor,
            threshold,
            frames,
        } => {
            let matcher_config = MatcherConfig::new(
                resize_factor.unwrap_or(config.resize_factor),
                config.resolve_match_threshold(threshold, &backend),
            )?;
            let gallery = Gallery::load(&gallery, &mut backend)?;
            let matcher = FrameMatcher::new(matcher_config);
            tracing::debug!(config = ?matcher.config(), entries = gallery.len(), "matcher ready");

            for path in frames {
                let frame = match read_frame(&path) {
                    Ok(frame) => frame,
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "skipping frame");
                        continue;
                    }
                };
                let faces = matcher.detect_known_faces(&mut backend, &frame, &gallery)?;
                println!(
                    "{}",
                    serde_json::json!({ "frame": path.display().to_string(), "faces": faces })
                );
            }
        }
    }

    Ok(())
}

/// Decode an image file into a BGR frame, as a capture device would deliver it.
fn read_frame(path: &Path) -> Result<Frame> {
    let rgb = image::open(path)
        .with_context(|| format!("decoding {}", path.display()))?
        .to_rgb8();
    Ok(Frame::from_rgb_image(&rgb)?)
}
