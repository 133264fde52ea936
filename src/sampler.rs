use std::path::Path;

use image::{DynamicImage, imageops::FilterType};
use log::{debug, info};
use palette::Srgb;

use crate::error::{ExtractError, Result};

/// Side length of the square the image is resized to before sampling.
pub const SAMPLE_SIZE: u32 = 150;

/// Decode `path` and flatten it into one sample per pixel of a
/// `size`×`size` thumbnail.
pub fn load_samples(path: &Path, size: u32) -> Result<Vec<Srgb<u8>>> {
    if !path.is_file() {
        return Err(ExtractError::InvalidInputPath(path.to_path_buf()));
    }

    info!("Reading image...");
    let img = image::open(path).map_err(|source| ExtractError::InvalidImageFile {
        path: path.to_path_buf(),
        source,
    })?;

    samples_from_image(&img, size)
}

/// Resize (ignoring aspect ratio) and drop alpha. Nearest-neighbour keeps
/// the source colors intact instead of blending them at edges.
pub fn samples_from_image(img: &DynamicImage, size: u32) -> Result<Vec<Srgb<u8>>> {
    if size == 0 {
        return Err(ExtractError::InvalidArgument(
            "Sampling resolution must be a positive integer.".to_string(),
        ));
    }

    let (w, h) = (img.width(), img.height());
    debug!("Resizing {w}x{h} image to {size}x{size}");

    let rgb8 = img.resize_exact(size, size, FilterType::Nearest).to_rgb8();
    let samples = rgb8
        .into_raw()
        .chunks_exact(3)
        .map(|chunk| Srgb::new(chunk[0], chunk[1], chunk[2]))
        .collect();

    Ok(samples)
}
