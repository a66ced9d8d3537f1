use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::cascade_model::CascadeModel;
use crate::detection::infrastructure::integral::{luminance, IntegralImage};
use crate::shared::constants::{CASCADE_MIN_NEIGHBORS, CASCADE_SCALE_FACTOR};
use crate::shared::error::StreamError;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Position-similarity tolerance used when grouping raw hits, as a
/// fraction of the rectangle size.
const GROUPING_EPS: f64 = 0.2;

/// Staged Haar cascade detector over a luminance transform of the frame.
///
/// Classic Viola-Jones evaluation: a scale pyramid of sliding windows,
/// each window normalized by its intensity standard deviation and passed
/// through the cascade's rejection stages. A true face fires at many
/// adjacent positions and scales, so raw hits are clustered and only
/// clusters with at least `min_neighbors` members survive — single
/// stray windows are discarded as false positives.
pub struct HaarCascadeDetector {
    model: CascadeModel,
    scale_factor: f64,
    min_neighbors: usize,
    gray: Vec<u8>,
}

impl HaarCascadeDetector {
    /// Detector with the reference tuning: scale factor 1.3, five
    /// confirming neighbors.
    pub fn new(model: CascadeModel) -> Self {
        Self::with_params(model, CASCADE_SCALE_FACTOR, CASCADE_MIN_NEIGHBORS)
    }

    pub fn with_params(model: CascadeModel, scale_factor: f64, min_neighbors: usize) -> Self {
        debug_assert!(scale_factor > 1.0);
        Self {
            model,
            scale_factor,
            min_neighbors,
            gray: Vec::new(),
        }
    }

    pub fn from_file(path: &Path, scale_factor: f64, min_neighbors: usize) -> Result<Self, StreamError> {
        Ok(Self::with_params(
            CascadeModel::load(path)?,
            scale_factor,
            min_neighbors,
        ))
    }

    fn scan(&self, integral: &IntegralImage) -> Vec<Region> {
        let mut hits = Vec::new();
        let base_w = self.model.window_width as f64;
        let base_h = self.model.window_height as f64;

        let mut scale = 1.0f64;
        loop {
            let win_w = (base_w * scale).round() as usize;
            let win_h = (base_h * scale).round() as usize;
            if win_w > integral.width() || win_h > integral.height() {
                break;
            }

            // Shift grows with scale so coarse scales stay cheap.
            let step = (scale * 2.0).round().max(1.0) as usize;

            for y in (0..=integral.height() - win_h).step_by(step) {
                for x in (0..=integral.width() - win_w).step_by(step) {
                    if self.window_passes(integral, x, y, win_w, win_h, scale) {
                        hits.push(Region::new(x as i32, y as i32, win_w as i32, win_h as i32));
                    }
                }
            }

            scale *= self.scale_factor;
        }

        hits
    }

    fn window_passes(
        &self,
        integral: &IntegralImage,
        x: usize,
        y: usize,
        win_w: usize,
        win_h: usize,
        scale: f64,
    ) -> bool {
        let inv_area = 1.0 / (win_w * win_h) as f64;
        let stddev = integral.window_stddev(x, y, win_w, win_h);

        for stage in &self.model.stages {
            let mut stage_sum = 0.0;
            for wc in &stage.classifiers {
                let mut feature_sum = 0.0;
                for rect in &wc.feature.rects {
                    let rx = x + (rect.x as f64 * scale).round() as usize;
                    let ry = y + (rect.y as f64 * scale).round() as usize;
                    let rw = ((rect.width as f64 * scale).round() as usize).min(x + win_w - rx);
                    let rh = ((rect.height as f64 * scale).round() as usize).min(y + win_h - ry);
                    feature_sum += integral.rect_sum(rx, ry, rw, rh) as f64 * rect.weight;
                }
                stage_sum += if feature_sum * inv_area < wc.threshold * stddev {
                    wc.left_value
                } else {
                    wc.right_value
                };
            }
            if stage_sum < stage.threshold {
                return false;
            }
        }

        true
    }
}

impl FaceDetector for HaarCascadeDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, StreamError> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        if width < self.model.window_width as usize || height < self.model.window_height as usize {
            return Ok(Vec::new());
        }

        let mut gray = std::mem::take(&mut self.gray);
        luminance(frame, &mut gray);
        let integral = IntegralImage::new(&gray, width, height);
        self.gray = gray;

        let hits = self.scan(&integral);
        let grouped = group_hits(&hits, self.min_neighbors, GROUPING_EPS);

        Ok(grouped
            .into_iter()
            .filter_map(|r| r.clamp(frame.width(), frame.height()))
            .collect())
    }
}

/// Clusters raw hits by position/size similarity and averages each
/// cluster, keeping only clusters with at least `min_neighbors` members.
fn group_hits(hits: &[Region], min_neighbors: usize, eps: f64) -> Vec<Region> {
    let mut clusters: Vec<Vec<Region>> = Vec::new();

    for &hit in hits {
        match clusters.iter_mut().find(|c| similar(c[0], hit, eps)) {
            Some(cluster) => cluster.push(hit),
            None => clusters.push(vec![hit]),
        }
    }

    clusters
        .into_iter()
        .filter(|c| c.len() >= min_neighbors.max(1))
        .map(|c| average(&c))
        .collect()
}

/// OpenCV-style similarity test: centers and sizes within `eps` of the
/// smaller rectangle's extent.
fn similar(a: Region, b: Region, eps: f64) -> bool {
    let delta = eps * 0.5 * (a.width.min(b.width) + a.height.min(b.height)) as f64;
    (a.x - b.x).abs() as f64 <= delta
        && (a.y - b.y).abs() as f64 <= delta
        && (a.x + a.width - b.x - b.width).abs() as f64 <= delta
        && (a.y + a.height - b.y - b.height).abs() as f64 <= delta
}

fn average(cluster: &[Region]) -> Region {
    let n = cluster.len() as i64;
    let sum = |f: fn(&Region) -> i32| -> i32 {
        (cluster.iter().map(|r| f(r) as i64).sum::<i64>() / n) as i32
    };
    Region::new(
        sum(|r| r.x),
        sum(|r| r.y),
        sum(|r| r.width),
        sum(|r| r.height),
    )
}
