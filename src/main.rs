use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use whitted_tracer::consts::OUT_FILE;
use whitted_tracer::description::load_scene;
use whitted_tracer::parallel::{ render, RenderConfig };

/// Renders a JSON scene description with a recursive Whitted ray tracer.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Scene description to render.
    scene: PathBuf,

    /// Output image; `.png` writes PNG, anything else plain PPM.
    #[clap(short, long, default_value = OUT_FILE)]
    output: PathBuf,

    /// Worker threads; defaults to the available parallelism.
    #[clap(short, long)]
    threads: Option<usize>,

    /// Average a 2x2 grid of samples per pixel.
    #[clap(long)]
    supersample: bool,

    /// Place the camera with the scene's camera transform, even when the
    /// scene doesn't ask for it.
    #[clap(long)]
    camera_transform: bool,

    /// Render through a thin lens.
    #[clap(long)]
    dof: bool,

    /// Lens radius; defaults to the scene's lens, then 0.1.
    #[clap(long)]
    aperture: Option<f64>,

    /// In-focus distance; defaults to the scene's lens, then the distance
    /// to the camera target.
    #[clap(long)]
    focus_distance: Option<f64>,

    /// Overrides the scene's recursion limit.
    #[clap(long)]
    max_bounces: Option<usize>,
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut scene = load_scene(&args.scene)?;

    let camera = &mut scene.camera;
    if args.camera_transform {
        camera.enable_transform();
    }

    if let Some(max_bounce) = args.max_bounces {
        camera.max_bounce = max_bounce;
    }

    let lens_override = args.aperture.is_some() || args.focus_distance.is_some();
    if args.dof || (camera.depth_of_field.is_some() && lens_override) {
        camera.enable_depth_of_field(args.aperture, args.focus_distance);
    }

    let mut config = RenderConfig::default();
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    config.supersample = args.supersample;

    let canvas = render(&scene, &scene.camera, &config);
    canvas.save(&args.output)?;

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
