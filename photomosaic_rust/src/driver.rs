use anyhow::{anyhow, bail, Result};
use image::RgbImage;
use log::{debug, info};
use parking_lot::Mutex;
use std::thread;

use crate::histogram::{check_bins, Histogram};
use crate::loader::CandidatePool;
use crate::tiling::{split_bands, tile_band, BlockGrid};

/// How the fingerprint cache and the tiling loop are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Serial,
    Parallel { threads: usize },
}

impl Strategy {
    /// `Some(0)` is serial, `Some(n)` pins `n` workers, `None` uses every available core.
    pub fn from_threads(threads: Option<usize>) -> Self {
        match threads {
            Some(0) => Self::Serial,
            Some(n) => Self::Parallel { threads: n },
            None => Self::Parallel { threads: num_cpus::get().max(1) },
        }
    }

    pub fn threads(&self) -> usize {
        match *self {
            Self::Serial => 1,
            Self::Parallel { threads } => threads,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosaicStats {
    pub blocks: usize,
    pub candidates: usize,
    pub threads: usize,
}

/// One fingerprint per candidate, indexed like the pool.
pub fn fingerprint_pool(pool: &CandidatePool, bins: usize, strategy: Strategy) -> Result<Vec<Histogram>> {
    check_bins(bins)?;
    let images = pool.images();
    let threads = strategy.threads().min(images.len()).max(1);
    if strategy == Strategy::Serial || threads == 1 {
        return Ok(images.iter().map(|img| Histogram::of_image(img, bins)).collect());
    }

    let chunk = images.len().div_ceil(threads);
    thread::scope(|s| -> Result<Vec<Histogram>> {
        let handles: Vec<_> = images
            .chunks(chunk)
            .map(|part| s.spawn(move || part.iter().map(|img| Histogram::of_image(img, bins)).collect::<Vec<_>>()))
            .collect();
        let mut out = Vec::with_capacity(images.len());
        for h in handles {
            out.extend(h.join().map_err(|_| anyhow!("fingerprint worker panicked"))?);
        }
        Ok(out)
    })
}

/// Build the mosaic in place: every `step_x` × `step_y` block of `target` is
/// overwritten by its best-matching candidate.
pub fn generate(target: &mut RgbImage, pool: &CandidatePool, step_x: u32, step_y: u32, bins: usize, strategy: Strategy) -> Result<MosaicStats> {
    if step_x == 0 || step_y == 0 { bail!("block steps must be positive (got {}x{})", step_x, step_y) }
    check_bins(bins)?;
    if pool.is_empty() { bail!("candidate pool is empty") }
    if pool.block_dimensions() != (step_x, step_y) {
        let (w, h) = pool.block_dimensions();
        bail!("candidates are {}x{} but blocks are {}x{}", w, h, step_x, step_y);
    }

    let (width, height) = target.dimensions();
    let grid = BlockGrid::new(width, height, step_x, step_y);
    let fingerprints = fingerprint_pool(pool, bins, strategy)?;
    debug!("cached {} fingerprints of {} bins", fingerprints.len(), fingerprints.first().map_or(0, Histogram::len));

    let bands = split_bands(target, step_y);
    let workers = strategy.threads().min(bands.len()).max(1);
    let blocks = match strategy {
        Strategy::Serial => bands.into_iter().map(|mut band| tile_band(&mut band, step_x, pool, &fingerprints, bins)).sum::<usize>(),
        Strategy::Parallel { .. } => {
            let queue = Mutex::new(bands.into_iter());
            let (queue, fingerprints) = (&queue, &fingerprints);
            thread::scope(|s| -> Result<usize> {
                let handles: Vec<_> = (0..workers)
                    .map(|_| {
                        s.spawn(move || {
                            let mut done = 0;
                            loop {
                                let next = queue.lock().next();
                                let Some(mut band) = next else { break };
                                done += tile_band(&mut band, step_x, pool, fingerprints, bins);
                            }
                            done
                        })
                    })
                    .collect();
                let mut total = 0;
                for h in handles {
                    total += h.join().map_err(|_| anyhow!("tiling worker panicked"))?;
                }
                Ok(total)
            })?
        }
    };
    debug_assert_eq!(blocks, grid.block_count());
    info!("tiled {} blocks ({}x{} grid) with {} worker(s)", blocks, grid.columns(), grid.rows(), workers);

    Ok(MosaicStats { blocks, candidates: pool.len(), threads: workers })
}
