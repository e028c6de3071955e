//! Geometry viewer: draws a model file from the resources directory.
//!
//! Usage: `prism-viewer [MODEL] [SHADER]`
//!
//! `MODEL` is a file under `<resources>/models` (default `webgpu.txt`);
//! `SHADER` is an optional WGSL file under `<resources>/shaders`, replacing the
//! embedded program. `<resources>` is `$PRISM_RESOURCES` or the crate's
//! `resources/` directory.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use prism_engine::logging::{init_logging, LoggingConfig};
use prism_engine::render::RendererConfig;
use prism_engine::window::Runtime;

const DEFAULT_MODEL: &str = "webgpu.txt";

fn resources_root() -> PathBuf {
    std::env::var_os("PRISM_RESOURCES")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/resources")))
}

fn run() -> Result<()> {
    let root = resources_root();
    let mut args = std::env::args().skip(1);
    let model = args.next().unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let shader = args.next();

    let model_path = root.join("models").join(&model);
    let geometry = prism_geom::load_file(&model_path)
        .with_context(|| format!("couldn't load geometry '{model}'"))?;
    log::info!(
        "loaded {}: {} point(s), {} triangle(s)",
        model_path.display(),
        geometry.point_count(),
        geometry.triangle_count()
    );

    let mut config = RendererConfig::default();
    if let Some(shader) = shader {
        config = config.with_shader_file(root.join("shaders").join(shader));
    }

    Runtime::run(config, geometry)
}

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
