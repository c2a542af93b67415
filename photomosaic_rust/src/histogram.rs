use anyhow::{bail, Result};
use image::RgbImage;

use crate::tiling::Block;

/// 8-bit channels leave every bin above 256 empty.
pub const MAX_BINS: usize = 256;

/// Reject bin counts outside `1..=MAX_BINS`.
pub fn check_bins(bins: usize) -> Result<()> {
    if bins == 0 || bins > MAX_BINS { bail!("bins per channel must be in 1..={} (got {})", MAX_BINS, bins) }
    Ok(())
}

/// Joint 3-channel color histogram with `bins³` raw (unnormalized) counts.
///
/// Layout is `(b0 * bins + b1) * bins + b2` where `bK` is the bin of channel K.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bins: usize,
    counts: Vec<u64>,
}

/// Bin of a single channel value: `floor(v * bins / 256)`, clamped to `bins - 1`.
#[inline]
pub fn bin_index(v: u8, bins: usize) -> usize {
    (v as usize * bins / 256).min(bins - 1)
}

impl Histogram {
    pub fn new(bins: usize) -> Self {
        assert!((1..=MAX_BINS).contains(&bins), "bins per channel must be in 1..={MAX_BINS}");
        Self { bins, counts: vec![0; bins * bins * bins] }
    }

    /// Fingerprint of a `block` inside an interleaved RGB buffer whose rows are
    /// `row_stride` bytes apart. Block coordinates are relative to `pixels`.
    pub fn of_region(pixels: &[u8], row_stride: usize, block: Block, bins: usize) -> Self {
        let mut hist = Self::new(bins);
        let (x0, w) = (block.x as usize, block.width as usize);
        for row in block.y as usize..(block.y + block.height) as usize {
            let start = row * row_stride + x0 * 3;
            for px in pixels[start..start + w * 3].chunks_exact(3) {
                hist.add(px[0], px[1], px[2]);
            }
        }
        hist
    }

    pub fn of_image(img: &RgbImage, bins: usize) -> Self {
        let (w, h) = img.dimensions();
        let block = Block { x: 0, y: 0, width: w, height: h };
        Self::of_region(img.as_raw(), w as usize * 3, block, bins)
    }

    #[inline]
    pub fn add(&mut self, c0: u8, c1: u8, c2: u8) {
        let b = self.bins;
        let idx = (bin_index(c0, b) * b + bin_index(c1, b)) * b + bin_index(c2, b);
        self.counts[idx] += 1;
    }

    pub fn bins_per_channel(&self) -> usize { self.bins }

    pub fn len(&self) -> usize { self.counts.len() }

    pub fn is_empty(&self) -> bool { self.counts.iter().all(|&c| c == 0) }

    pub fn counts(&self) -> &[u64] { &self.counts }

    /// Count in the joint bin `(b0, b1, b2)`.
    pub fn get(&self, b0: usize, b1: usize, b2: usize) -> u64 {
        self.counts[(b0 * self.bins + b1) * self.bins + b2]
    }

    /// Total mass, i.e. the number of pixels counted.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}
