use anyhow::{bail, Context, Result};
use image::{io::Reader as ImageReader, RgbImage};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub mod driver;
pub mod histogram;
pub mod loader;
pub mod matcher;
pub mod tiling;

pub use driver::{fingerprint_pool, generate, MosaicStats, Strategy};
pub use histogram::{check_bins, Histogram, MAX_BINS};
pub use loader::{load_candidates, CandidatePool};
pub use matcher::{best_match, similarity, Match};
pub use tiling::{grid_steps, Block, BlockGrid};

/// Above this many bins per channel a single fingerprint exceeds 16 MiB.
const LARGE_PRECISION: usize = 128;

#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of candidate images; `None` loads all of them.
    pub max_images: Option<usize>,
    pub blocks_x: u32,
    pub blocks_y: u32,
    /// Histogram bins per channel.
    pub precision: usize,
    /// Worker threads; `Some(0)` runs serially, `None` uses every core.
    pub threads: Option<usize>,
}

pub fn default_config() -> Config {
    Config { max_images: None, blocks_x: 100, blocks_y: 150, precision: 8, threads: None }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        check_bins(self.precision).context("invalid precision")?;
        if self.blocks_x == 0 || self.blocks_y == 0 { bail!("block counts must be positive (got {}x{})", self.blocks_x, self.blocks_y) }
        if self.precision > LARGE_PRECISION {
            warn!("precision {} means {} bins per fingerprint", self.precision, self.precision.pow(3));
        }
        Ok(())
    }

    pub fn strategy(&self) -> Strategy { Strategy::from_threads(self.threads) }
}

#[derive(Debug, Clone)]
pub struct Params {
    pub images_dir: PathBuf,
    pub target_path: PathBuf,
    /// Where to write the mosaic; defaults to `<target stem>_mosaic.png` beside the target.
    pub output_path: Option<PathBuf>,
    pub config: Config,
}

/// Default output location for a target image.
pub fn default_output_path(target_path: &Path) -> PathBuf {
    let stem = target_path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    target_path.with_file_name(format!("{}_mosaic.png", stem))
}

/// Mosaic an in-memory target with an already loaded pool.
pub fn process_image(target: &mut RgbImage, pool: &CandidatePool, config: &Config) -> Result<MosaicStats> {
    config.validate()?;
    let (step_x, step_y) = grid_steps(target.width(), target.height(), config.blocks_x, config.blocks_y)?;
    generate(target, pool, step_x, step_y, config.precision, config.strategy())
}

/// Load the target and the candidate pool, build the mosaic and save it.
/// Returns the path written.
pub fn process(params: Params) -> Result<PathBuf> {
    let Params { images_dir, target_path, output_path, config } = params;
    config.validate()?;
    info!("Starting photomosaic (Rust)");
    info!("Images: {}", images_dir.display()); info!("Target: {}", target_path.display());
    info!("Grid: {}x{}, precision: {}, strategy: {:?}", config.blocks_x, config.blocks_y, config.precision, config.strategy());

    let mut target = ImageReader::open(&target_path)
        .and_then(|r| r.with_guessed_format())
        .with_context(|| format!("opening target {}", target_path.display()))?
        .decode()
        .with_context(|| format!("decoding target {}", target_path.display()))?
        .to_rgb8();
    let (step_x, step_y) = grid_steps(target.width(), target.height(), config.blocks_x, config.blocks_y)?;
    info!("Target {}x{}, block size {}x{}", target.width(), target.height(), step_x, step_y);

    let start = Instant::now();
    let pool = load_candidates(&images_dir, config.max_images, step_x, step_y)?;
    info!("Loaded {} source images in {} ms", pool.len(), start.elapsed().as_millis());

    let start = Instant::now();
    let stats = generate(&mut target, &pool, step_x, step_y, config.precision, config.strategy())?;
    info!("Generated photomosaic ({} blocks, {} threads) in {} ms", stats.blocks, stats.threads, start.elapsed().as_millis());

    let out = output_path.unwrap_or_else(|| default_output_path(&target_path));
    target.save(&out).with_context(|| format!("writing {}", out.display()))?;
    info!("Output saved: {}", out.display());
    Ok(out)
}
