//! pano: stitch an ordered list of overlapping images into one PNG panorama.

use clap::{Parser, Subcommand, ValueEnum};
use pano_stitch::{StitchConfig, Stitcher};
use std::path::PathBuf;
use std::time::Instant;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "pano")]
#[command(about = "Stitch overlapping frames of a horizontal sweep into a panorama")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stitch images, in sweep order, into a PNG.
    Stitch {
        /// Output PNG path.
        #[arg(long, short)]
        out: PathBuf,

        /// Configuration file (TOML, or JSON with a .json extension).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Preset used when no configuration file is given.
        #[arg(long, value_enum, default_value_t = Preset::Balanced)]
        preset: Preset,

        /// Worker threads (defaults to the number of CPUs).
        #[arg(long)]
        threads: Option<usize>,

        /// RANSAC seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Input images.
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Print a configuration preset.
    Config {
        #[arg(long, value_enum, default_value_t = Preset::Balanced)]
        preset: Preset,

        #[arg(long, value_enum, default_value_t = Format::Toml)]
        format: Format,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Balanced,
    Fast,
    Precise,
}

impl Preset {
    fn config(self) -> StitchConfig {
        match self {
            Preset::Balanced => StitchConfig::balanced_preset(),
            Preset::Fast => StitchConfig::fast_preset(),
            Preset::Precise => StitchConfig::precise_preset(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Toml,
    Json,
}

fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Stitch { out, config, preset, threads, seed, images } => {
            run_stitch(&out, config.as_deref(), preset, threads, seed, &images)
        }
        Commands::Config { preset, format } => run_config(preset, format),
    }
}

fn load_config(path: &std::path::Path) -> CliResult<StitchConfig> {
    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        StitchConfig::load_json(path)
    } else {
        StitchConfig::load_toml(path)
    }
}

fn run_stitch(
    out: &std::path::Path,
    config_path: Option<&std::path::Path>,
    preset: Preset,
    threads: Option<usize>,
    seed: Option<u64>,
    images: &[PathBuf],
) -> CliResult<()> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => preset.config(),
    };
    if let Some(n) = threads {
        config.features.n_threads = n;
    }
    if let Some(s) = seed {
        config.ransac.seed = s;
    }
    log::info!("{}", config.summary());

    let mut stitcher = Stitcher::new(config)?;
    for path in images {
        let img = image::open(path)
            .map_err(|e| -> CliError { format!("Failed to open image {}: {}", path.display(), e).into() })?
            .to_rgba8();
        let (w, h) = img.dimensions();
        log::info!("Loaded {} ({}x{})", path.display(), w, h);
        stitcher.add_frame(img.as_raw(), w, h)?;
    }

    let t0 = Instant::now();
    let panorama = match stitcher.stitch_panorama() {
        Ok(p) => p,
        Err(pano_stitch::StitchError::InsufficientFrames { usable }) => {
            return Err(format!("Only {} of {} frames could be aligned; nothing written", usable, images.len()).into());
        }
        Err(e) => return Err(e.into()),
    };
    let png = panorama.to_png()?;
    std::fs::write(out, &png)?;

    for pair in &panorama.alignment.pairs {
        match &pair.failure {
            None => println!("  pair {}-{}: {} matches, {} inliers", pair.index, pair.index + 1, pair.matches, pair.inliers),
            Some(f) => println!("  pair {}-{}: not aligned ({})", pair.index, pair.index + 1, f),
        }
    }
    println!(
        "Stitched {} of {} frames into {}x{} in {:.2?}, saved to {}",
        panorama.frames_used(),
        images.len(),
        panorama.width(),
        panorama.height(),
        t0.elapsed(),
        out.display()
    );
    Ok(())
}

fn run_config(preset: Preset, format: Format) -> CliResult<()> {
    let config = preset.config();
    let text = match format {
        Format::Toml => config.to_toml()?,
        Format::Json => config.to_json()?,
    };
    println!("{}", text);
    Ok(())
}
