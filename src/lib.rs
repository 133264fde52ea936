//! Dominant color extraction.
//!
//! An image is shrunk to a fixed thumbnail, its pixels are clustered with
//! k-means in RGB, and each centroid becomes a [`PaletteEntry`] carrying its
//! HSV color and how many pixels fell into it. [`postprocess::apply_steps`]
//! then sorts, trims and tweaks the palette and [`output`] renders it.

pub mod convert;
pub mod error;
pub mod output;
pub mod postprocess;
pub mod quantize;
pub mod sampler;

use std::path::Path;

pub use convert::{HsvColor, hsv_to_rgb, rgb_to_hex, rgb_to_hsv};
pub use error::{ExtractError, Result};
pub use output::{
    ColorFormat, FormatOptions, SaveOutcome, confirm_destination, format_color, render_palette,
    save_palette, write_palette,
};
pub use postprocess::{Modification, SortKey, Step, apply_steps};
pub use quantize::{ClusterPlan, KmeansSettings, Notice, PaletteEntry, Severity, plan_clusters, quantize};
pub use sampler::{SAMPLE_SIZE, load_samples, samples_from_image};

#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Side of the square thumbnail that gets sampled.
    pub sample_size: u32,
    pub kmeans: KmeansSettings,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            sample_size: SAMPLE_SIZE,
            kmeans: KmeansSettings::default(),
        }
    }
}

/// Load the image at `path` and cluster it. Entries come back least
/// frequent first.
pub fn extract_palette(path: &Path, options: &ExtractOptions) -> Result<Vec<PaletteEntry>> {
    let samples = load_samples(path, options.sample_size)?;
    quantize(&samples, &options.kmeans)
}
