// CLI entry for photomosaic
use anyhow::Result;
use clap::{Parser, ValueHint};
use photomosaic_rust::{default_config, process, Config, Params};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "photomosaic", version, about = "Photomosaic generator (histogram correlation matching)")]
struct Cli {
    /// Directory of the source images
    #[arg(short = 'I', long = "images", value_hint = ValueHint::DirPath)]
    images: PathBuf,
    /// Target image
    #[arg(short = 't', long = "target", value_hint = ValueHint::FilePath)]
    target: PathBuf,
    /// Limit the maximum number of source images
    #[arg(short = 'n')]
    n: Option<usize>,

    /// Number of x blocks
    #[arg(long = "xn")]
    xn: Option<u32>,
    /// Number of y blocks
    #[arg(long = "yn")]
    yn: Option<u32>,
    /// Histogram size (bins per channel)
    #[arg(long = "precision")]
    precision: Option<usize>,
    /// Number of threads for generating the mosaic (0 for serial)
    #[arg(long = "threads")]
    threads: Option<usize>,

    /// Output path (default: <target>_mosaic.png)
    #[arg(short = 'o', long = "output", value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

fn build_config(cli: &Cli) -> Config {
    let mut cfg = default_config();
    cfg.max_images = cli.n;
    if let Some(v) = cli.xn { cfg.blocks_x = v; }
    if let Some(v) = cli.yn { cfg.blocks_y = v; }
    if let Some(v) = cli.precision { cfg.precision = v; }
    cfg.threads = cli.threads;
    cfg
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = build_config(&cli);
    let params = Params {
        images_dir: cli.images,
        target_path: cli.target,
        output_path: cli.output,
        config: cfg,
    };
    let out = process(params)?;
    println!("{}", out.display());
    Ok(())
}
