use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::RgbImage;

use organic_grain::image_io;
use organic_grain::rng::seed_from_input;
use organic_grain::{
    DenoiseMode, FrameProgress, FrameRequest, GrainParams, GrainPreset, GrainRenderer,
    run_sequence,
};

#[derive(Parser)]
#[command(name = "organic-grain")]
#[command(about = "Film grain and sensor noise synthesizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a single frame
    Render(RenderArgs),

    /// Export a numbered frame sequence
    Sequence(SequenceArgs),

    /// List the built-in presets
    Presets,
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    grain: GrainArgs,

    /// Frame offset for the temporal noise stream
    #[arg(long, default_value_t = 0)]
    frame: u64,

    /// Output image; the format follows the extension
    #[arg(short, long, default_value = "grain.png")]
    output: PathBuf,
}

#[derive(Args)]
struct SequenceArgs {
    #[command(flatten)]
    grain: GrainArgs,

    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Last frame, inclusive
    #[arg(long, default_value_t = 23)]
    end: u64,

    /// Directory receiving frame_NNNNN.png files
    #[arg(short, long, default_value = "frames")]
    output_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    Clean,
    FineFilm,
    Iso3200,
    Camcorder,
}

impl From<PresetArg> for GrainPreset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Clean => GrainPreset::Clean,
            PresetArg::FineFilm => GrainPreset::FineFilm,
            PresetArg::Iso3200 => GrainPreset::Iso3200,
            PresetArg::Camcorder => GrainPreset::Camcorder,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DenoiseArg {
    Off,
    Photographic,
    EdgeAware,
}

/// Every tunable, layered over the chosen preset. Unset flags keep the
/// preset's value.
#[derive(Args)]
struct GrainArgs {
    #[arg(long, default_value_t = 1920)]
    width: u32,

    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Starting parameter set
    #[arg(long, value_enum, default_value = "clean")]
    preset: PresetArg,

    /// Master seed; non-numeric input falls back to 0
    #[arg(long, default_value = "0")]
    seed: String,

    /// Background image, resampled to the target size
    #[arg(long)]
    background: Option<PathBuf>,

    #[arg(long)]
    gain: Option<f64>,
    #[arg(long)]
    offset: Option<f64>,
    #[arg(long)]
    banding: Option<f64>,

    #[arg(long)]
    shot: Option<f64>,
    #[arg(long)]
    read: Option<f64>,
    #[arg(long)]
    chroma: Option<f64>,
    #[arg(long)]
    shadow_bias: Option<f64>,
    #[arg(long)]
    grain_size: Option<u32>,

    #[arg(long)]
    firefly_density: Option<f64>,
    #[arg(long)]
    firefly_intensity: Option<f64>,
    #[arg(long)]
    firefly_coloration: Option<f64>,

    /// Effective bits per channel (4-8)
    #[arg(long)]
    bit_depth: Option<u8>,
    /// Supersampling factor (1-4)
    #[arg(long)]
    supersample: Option<u32>,

    /// Positive dilates highlights, negative erodes them
    #[arg(long, allow_hyphen_values = true)]
    bloom: Option<i32>,
    #[arg(long)]
    bloom_strength: Option<f64>,

    #[arg(long, value_enum)]
    denoise: Option<DenoiseArg>,
    #[arg(long, default_value_t = 10.0)]
    denoise_strength: f64,
    #[arg(long, default_value_t = 0.5)]
    denoise_detail: f64,
    #[arg(long, default_value_t = 10.0)]
    denoise_smoothing: f64,
    #[arg(long, default_value_t = 0.0)]
    denoise_sharpening: f64,
    #[arg(long)]
    denoise_mix: Option<f64>,

    #[arg(long)]
    micro_contrast: Option<f64>,
    #[arg(long)]
    texture_variation: Option<f64>,

    /// Saturation change in percent
    #[arg(long, allow_hyphen_values = true)]
    saturation: Option<f64>,
    #[arg(long)]
    filmic_saturation: Option<f64>,

    #[arg(long)]
    lift: Option<f64>,
    #[arg(long)]
    roll_off: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    contrast: Option<f64>,
}

impl GrainArgs {
    fn params(&self) -> GrainParams {
        let mut p = GrainPreset::from(self.preset).params();
        p.seed = seed_from_input(&self.seed);

        override_with(&mut p.gain_strength, self.gain);
        override_with(&mut p.offset_strength, self.offset);
        override_with(&mut p.banding_strength, self.banding);
        override_with(&mut p.shot_strength, self.shot);
        override_with(&mut p.read_strength, self.read);
        override_with(&mut p.chroma_strength, self.chroma);
        override_with(&mut p.shadow_bias, self.shadow_bias);
        override_with(&mut p.grain_size, self.grain_size);
        override_with(&mut p.firefly_density, self.firefly_density);
        override_with(&mut p.firefly_intensity, self.firefly_intensity);
        override_with(&mut p.firefly_coloration, self.firefly_coloration);
        override_with(&mut p.bit_depth, self.bit_depth);
        override_with(&mut p.supersample, self.supersample);
        override_with(&mut p.bloom, self.bloom);
        override_with(&mut p.bloom_strength, self.bloom_strength);
        override_with(&mut p.denoise_mix, self.denoise_mix);
        override_with(&mut p.micro_contrast, self.micro_contrast);
        override_with(&mut p.texture_variation, self.texture_variation);
        override_with(&mut p.saturation, self.saturation);
        override_with(&mut p.filmic_saturation, self.filmic_saturation);
        override_with(&mut p.lift, self.lift);
        override_with(&mut p.roll_off, self.roll_off);
        override_with(&mut p.contrast, self.contrast);

        if let Some(mode) = self.denoise {
            p.denoise = match mode {
                DenoiseArg::Off => DenoiseMode::Off,
                DenoiseArg::Photographic => DenoiseMode::Photographic {
                    strength: self.denoise_strength,
                    detail: self.denoise_detail,
                },
                DenoiseArg::EdgeAware => DenoiseMode::EdgeAware {
                    smoothing: self.denoise_smoothing,
                    sharpening: self.denoise_sharpening,
                },
            };
        }
        p
    }

    fn background(&self) -> Result<Option<RgbImage>> {
        self.background
            .as_deref()
            .map(|path| {
                image_io::load_background(path, self.width, self.height)
                    .with_context(|| format!("loading background {}", path.display()))
            })
            .transpose()
    }
}

fn override_with<T: Copy>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn render(args: RenderArgs) -> Result<()> {
    let params = args.grain.params();
    let background = args.grain.background()?;
    let renderer = GrainRenderer::new();

    let request = FrameRequest::new(args.grain.width, args.grain.height, &params)
        .with_frame(args.frame)
        .with_background(background.as_ref());
    let frame = renderer.render_frame(&request)?;
    save(&frame, &args.output)?;
    log::info!("Wrote {}", args.output.display());
    Ok(())
}

fn sequence(args: SequenceArgs) -> Result<()> {
    if args.start > args.end {
        bail!("--start {} is after --end {}", args.start, args.end);
    }
    let params = args.grain.params();
    let background = args.grain.background()?;
    let (width, height) = (args.grain.width, args.grain.height);
    let output_dir = args.output_dir;
    let frames = args.start..=args.end;

    let (tx, rx) = mpsc::channel::<FrameProgress>();
    let worker = thread::spawn(move || -> Result<usize> {
        let renderer = GrainRenderer::new();
        let run = run_sequence(&renderer, width, height, frames, &params, background.as_ref(), tx)?;
        let mut failed = 0;
        for (frame, result) in run {
            let path = image_io::frame_path(&output_dir, frame);
            match result.map_err(anyhow::Error::from).and_then(|img| save(&img, &path)) {
                Ok(()) => log::debug!("Wrote {}", path.display()),
                Err(e) => {
                    log::error!("Frame {frame}: {e:#}");
                    failed += 1;
                }
            }
        }
        Ok(failed)
    });

    for progress in rx {
        log::info!(
            "Frame {} ({}/{}, {:.0}%)",
            progress.frame,
            progress.completed,
            progress.total,
            progress.fraction() * 100.0
        );
    }

    let failed = worker
        .join()
        .map_err(|_| anyhow::anyhow!("sequence worker panicked"))??;
    if failed > 0 {
        bail!("{failed} frame(s) failed");
    }
    Ok(())
}

fn save(img: &RgbImage, path: &Path) -> Result<()> {
    image_io::save_image(img, path).with_context(|| format!("writing {}", path.display()))
}

fn list_presets() {
    for &preset in GrainPreset::ALL {
        let p = preset.params();
        println!(
            "{:<10} read={} shot={} chroma={} bit_depth={} supersample={}",
            preset.name(),
            p.read_strength,
            p.shot_strength,
            p.chroma_strength,
            p.bit_depth,
            p.supersample
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Render(args) => render(args),
        Commands::Sequence(args) => sequence(args),
        Commands::Presets => {
            list_presets();
            Ok(())
        }
    }
}
