use std::collections::HashSet;

use kmeans_colors::{Kmeans, get_kmeans};
use log::{debug, info};
use palette::Srgb;

use crate::convert::{HsvColor, rgb_to_hsv};
use crate::error::{ExtractError, Result};

/// Cluster indices come back from `kmeans_colors` as `u8`.
pub const MAX_CLUSTERS: usize = 256;

/// How far above the requested color count the cluster count is raised
/// when the user asks for more colors than clusters.
pub const CLUSTER_MARGIN_PERCENT: usize = 20;

#[derive(Clone, Debug)]
pub struct KmeansSettings {
    pub clusters: usize,
    pub max_iter: usize,
    pub converge: f32,
    /// Independent restarts; the lowest-scoring one wins.
    pub runs: usize,
    pub seed: u64,
}

impl Default for KmeansSettings {
    fn default() -> Self {
        Self {
            clusters: 20,
            max_iter: 20,
            converge: 0.0025,
            runs: 3,
            seed: 0,
        }
    }
}

/// A cluster's color and how many samples fell into it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaletteEntry {
    pub color: HsvColor,
    pub count: usize,
}

/// Cluster `samples` and return one entry per centroid, least frequent first.
pub fn quantize(samples: &[Srgb<u8>], settings: &KmeansSettings) -> Result<Vec<PaletteEntry>> {
    let k = settings.clusters;
    if k == 0 {
        return Err(ExtractError::InvalidArgument(
            "Number of clusters must be a positive integer.".to_string(),
        ));
    }
    if k > MAX_CLUSTERS {
        return Err(ExtractError::InvalidArgument(format!(
            "Number of clusters must not exceed {MAX_CLUSTERS}, got {k}."
        )));
    }
    if k > samples.len() {
        return Err(ExtractError::InvalidArgument(format!(
            "Number of clusters ({k}) exceeds the number of sampled pixels ({}).",
            samples.len()
        )));
    }
    if settings.runs == 0 {
        return Err(ExtractError::InvalidArgument(
            "Number of k-means runs must be a positive integer.".to_string(),
        ));
    }

    // k-means++ cannot seed more centroids than there are distinct colors
    let distinct = samples
        .iter()
        .map(|s| (s.red, s.green, s.blue))
        .collect::<HashSet<_>>()
        .len();
    let k = if distinct < k {
        info!("Image has only {distinct} distinct colors, clustering into {distinct} instead of {k}");
        distinct
    } else {
        k
    };

    info!("Finding clusters...");
    let buf: Vec<Srgb> = samples.iter().map(|s| (*s).into_format()).collect();

    let best = (0..settings.runs)
        .map(|run| {
            let seed = settings.seed.wrapping_add(run as u64);
            let result: Kmeans<Srgb> =
                get_kmeans(k, settings.max_iter, settings.converge, false, &buf, seed);
            debug!("k-means run {run} (seed {seed}): score {}", result.score);
            result
        })
        .min_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| ExtractError::InvalidArgument("No k-means runs were performed.".to_string()))?;
    let centroids = best.centroids;

    let counts = count_members(&buf, &centroids);

    let mut entries: Vec<PaletteEntry> = centroids
        .iter()
        .zip(counts)
        .map(|(c, count)| PaletteEntry {
            color: rgb_to_hsv(c.red * 255.0, c.green * 255.0, c.blue * 255.0),
            count,
        })
        .collect();
    entries.sort_by_key(|e| e.count);

    Ok(entries)
}

/// Index of the centroid closest to `sample` (squared Euclidean in RGB).
pub fn nearest_centroid(sample: &Srgb, centroids: &[Srgb]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f32::INFINITY;
    for (idx, c) in centroids.iter().enumerate() {
        let dr = sample.red - c.red;
        let dg = sample.green - c.green;
        let db = sample.blue - c.blue;
        let dist = dr * dr + dg * dg + db * db;
        if dist < best_dist {
            best_dist = dist;
            best_idx = idx;
        }
    }
    best_idx
}

fn count_members(samples: &[Srgb], centroids: &[Srgb]) -> Vec<usize> {
    let mut counts = vec![0usize; centroids.len()];
    for sample in samples {
        counts[nearest_centroid(sample, centroids)] += 1;
    }
    counts
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// The cluster count was changed.
    Adjusted,
    /// The cluster count was kept but results may suffer.
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterPlan {
    pub clusters: usize,
    pub notices: Vec<Notice>,
}

/// Check the cluster count against every requested color count, raising it
/// when a request exceeds it and warning when the margin is thin.
pub fn plan_clusters(clusters: usize, requested: &[usize]) -> Result<ClusterPlan> {
    if clusters == 0 {
        return Err(ExtractError::InvalidArgument(
            "Number of clusters must be a positive integer.".to_string(),
        ));
    }

    let mut clusters = clusters;
    let mut notices = Vec::new();

    for &n in requested {
        if n == 0 {
            return Err(ExtractError::InvalidArgument(
                "Desired number of colors must be a positive integer.".to_string(),
            ));
        }

        if n > clusters {
            let raised = (n * (100 + CLUSTER_MARGIN_PERCENT)) as f64 / 100.0;
            clusters = raised.round() as usize;
            notices.push(Notice {
                severity: Severity::Adjusted,
                message: format!(
                    "Number of clusters automatically adjusted to {CLUSTER_MARGIN_PERCENT}% more than number of desired colors ({n})"
                ),
            });
        } else if clusters == n {
            notices.push(Notice {
                severity: Severity::Warning,
                message: format!(
                    "Number of clusters is equal to the number of colors ({n})\n    Problems may occur with high numbers"
                ),
            });
        } else {
            let percent = (clusters - n) * 100 / n;
            if percent < CLUSTER_MARGIN_PERCENT {
                notices.push(Notice {
                    severity: Severity::Warning,
                    message: format!(
                        "Number of clusters is only {percent}% more than number of colors ({n})\n    Problems may occur with high numbers"
                    ),
                });
            }
        }
    }

    Ok(ClusterPlan { clusters, notices })
}
