use anyhow::{bail, Context, Result};
use image::imageops::{self, FilterType};
use image::{io::Reader as ImageReader, RgbImage};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered candidate tiles, all exactly `block_width` × `block_height`.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    images: Vec<RgbImage>,
    block_width: u32,
    block_height: u32,
}

impl CandidatePool {
    pub fn new(images: Vec<RgbImage>, block_width: u32, block_height: u32) -> Result<Self> {
        if images.is_empty() { bail!("candidate pool is empty") }
        if let Some((i, img)) = images.iter().enumerate().find(|(_, img)| img.dimensions() != (block_width, block_height)) {
            bail!("candidate {} is {}x{}, expected {}x{}", i, img.width(), img.height(), block_width, block_height);
        }
        Ok(Self { images, block_width, block_height })
    }

    pub fn images(&self) -> &[RgbImage] { &self.images }

    pub fn len(&self) -> usize { self.images.len() }

    pub fn is_empty(&self) -> bool { self.images.is_empty() }

    pub fn block_dimensions(&self) -> (u32, u32) { (self.block_width, self.block_height) }
}

fn decode_rgb(path: &Path) -> Result<RgbImage> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(img.to_rgb8())
}

/// Regular files of `dir`, sorted so the candidate order is stable across runs.
fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading image directory {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() { paths.push(path); }
    }
    paths.sort();
    Ok(paths)
}

/// Load up to `max_images` decodable images from `dir`, each resized to the block size.
///
/// Entries that fail to decode are skipped. `None` loads every decodable image.
pub fn load_candidates(dir: &Path, max_images: Option<usize>, block_width: u32, block_height: u32) -> Result<CandidatePool> {
    let limit = max_images.unwrap_or(usize::MAX);
    let mut images = Vec::new();
    for path in list_entries(dir)? {
        if images.len() >= limit { break; }
        match decode_rgb(&path) {
            Ok(img) => {
                debug!("loaded {} ({}x{})", path.display(), img.width(), img.height());
                images.push(imageops::resize(&img, block_width, block_height, FilterType::Triangle));
            }
            Err(e) => warn!("skipping {}: {}", path.display(), e),
        }
    }
    if images.is_empty() { bail!("no decodable candidate images found in {}", dir.display()) }
    CandidatePool::new(images, block_width, block_height)
}
