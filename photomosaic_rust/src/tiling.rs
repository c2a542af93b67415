use anyhow::{bail, Result};
use image::RgbImage;

use crate::histogram::Histogram;
use crate::loader::CandidatePool;
use crate::matcher::best_match;

/// Rectangle of a block; boundary blocks are clipped to the image edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Block {
    pub fn area(&self) -> u64 { self.width as u64 * self.height as u64 }
}

/// Step sizes for a `blocks_x` × `blocks_y` grid over a `width` × `height` target.
pub fn grid_steps(width: u32, height: u32, blocks_x: u32, blocks_y: u32) -> Result<(u32, u32)> {
    if blocks_x == 0 || blocks_y == 0 { bail!("block counts must be positive (got {}x{})", blocks_x, blocks_y) }
    let (step_x, step_y) = (width / blocks_x, height / blocks_y);
    if step_x == 0 || step_y == 0 {
        bail!("target {}x{} is smaller than the {}x{} block grid", width, height, blocks_x, blocks_y);
    }
    Ok((step_x, step_y))
}

/// Covering partition of a `width` × `height` area stepping by `(step_x, step_y)`.
#[derive(Debug, Clone, Copy)]
pub struct BlockGrid {
    pub width: u32,
    pub height: u32,
    pub step_x: u32,
    pub step_y: u32,
}

impl BlockGrid {
    pub fn new(width: u32, height: u32, step_x: u32, step_y: u32) -> Self {
        assert!(step_x > 0 && step_y > 0, "grid steps must be positive");
        Self { width, height, step_x, step_y }
    }

    pub fn columns(&self) -> u32 { self.width.div_ceil(self.step_x) }

    pub fn rows(&self) -> u32 { self.height.div_ceil(self.step_y) }

    pub fn block_count(&self) -> usize { self.columns() as usize * self.rows() as usize }

    pub fn block(&self, col: u32, row: u32) -> Block {
        let (x, y) = (col * self.step_x, row * self.step_y);
        Block { x, y, width: self.step_x.min(self.width - x), height: self.step_y.min(self.height - y) }
    }

    /// Blocks in row-major order.
    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        (0..self.rows()).flat_map(move |r| (0..self.columns()).map(move |c| self.block(c, r)))
    }
}

/// Horizontal strip of the target holding one grid row, owned exclusively by
/// whoever tiles it.
#[derive(Debug)]
pub struct Band<'a> {
    pub y: u32,
    pub height: u32,
    pub width: u32,
    pub pixels: &'a mut [u8],
}

/// Cut `target` into disjoint bands of `step_y` rows, top to bottom.
pub fn split_bands(target: &mut RgbImage, step_y: u32) -> Vec<Band<'_>> {
    let (width, height) = target.dimensions();
    if width == 0 || height == 0 { return Vec::new(); }
    let row_bytes = width as usize * 3;
    let buf: &mut [u8] = target;
    buf.chunks_mut(row_bytes * step_y as usize)
        .enumerate()
        .map(|(i, pixels)| Band {
            y: i as u32 * step_y,
            height: (pixels.len() / row_bytes) as u32,
            width,
            pixels,
        })
        .collect()
}

/// Replace every block of `band` with its best-matching candidate.
///
/// `fingerprints[i]` must be the fingerprint of `pool.images()[i]`. Returns the
/// number of blocks written.
pub fn tile_band(band: &mut Band<'_>, step_x: u32, pool: &CandidatePool, fingerprints: &[Histogram], bins: usize) -> usize {
    debug_assert_eq!(fingerprints.len(), pool.len(), "one fingerprint per candidate");
    let row_bytes = band.width as usize * 3;
    let mut written = 0;
    let mut x = 0;
    while x < band.width {
        let block = Block { x, y: 0, width: step_x.min(band.width - x), height: band.height };
        let hist = Histogram::of_region(band.pixels, row_bytes, block, bins);
        // Pool is never empty, so a match always exists.
        if let Some(m) = best_match(&hist, fingerprints) {
            copy_block(&pool.images()[m.index], band.pixels, row_bytes, block);
            written += 1;
        }
        x += step_x;
    }
    written
}

/// Copy the top-left `block.width` × `block.height` of `tile` into `block` of `dst`.
fn copy_block(tile: &RgbImage, dst: &mut [u8], row_stride: usize, block: Block) {
    let src = tile.as_raw();
    let src_stride = tile.width() as usize * 3;
    let len = block.width as usize * 3;
    for row in 0..block.height as usize {
        let s = row * src_stride;
        let d = (block.y as usize + row) * row_stride + block.x as usize * 3;
        dst[d..d + len].copy_from_slice(&src[s..s + len]);
    }
}
