use ndarray::Array2;

use crate::shared::frame::Frame;

/// Converts a BGR frame to 8-bit luminance using integer Rec.601 weights.
///
/// The detector only looks at luminance; the reusable `gray` buffer avoids
/// a per-frame allocation.
pub fn luminance(frame: &Frame, gray: &mut Vec<u8>) {
    let pixels = frame.width() as usize * frame.height() as usize;
    gray.clear();
    gray.reserve(pixels);
    for px in frame.data().chunks_exact(crate::shared::frame::CHANNELS) {
        let (b, g, r) = (px[0] as u32, px[1] as u32, px[2] as u32);
        gray.push(((r * 77 + g * 150 + b * 29) >> 8) as u8);
    }
}

/// Summed-area tables over a luminance image.
///
/// Both the plain and squared sums are kept with a one-pixel zero border,
/// so any rectangle sum is four lookups and window variance needs no
/// second pass.
pub struct IntegralImage {
    sum: Array2<u64>,
    sq_sum: Array2<u64>,
    width: usize,
    height: usize,
}

impl IntegralImage {
    pub fn new(gray: &[u8], width: usize, height: usize) -> Self {
        debug_assert_eq!(gray.len(), width * height);
        let mut sum = Array2::<u64>::zeros((height + 1, width + 1));
        let mut sq_sum = Array2::<u64>::zeros((height + 1, width + 1));

        for y in 0..height {
            let mut row_acc = 0u64;
            let mut row_sq_acc = 0u64;
            for x in 0..width {
                let v = gray[y * width + x] as u64;
                row_acc += v;
                row_sq_acc += v * v;
                sum[[y + 1, x + 1]] = sum[[y, x + 1]] + row_acc;
                sq_sum[[y + 1, x + 1]] = sq_sum[[y, x + 1]] + row_sq_acc;
            }
        }

        Self {
            sum,
            sq_sum,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Sum of pixel values in the rectangle starting at `(x, y)`.
    pub fn rect_sum(&self, x: usize, y: usize, w: usize, h: usize) -> u64 {
        debug_assert!(x + w <= self.width && y + h <= self.height);
        self.sum[[y + h, x + w]] + self.sum[[y, x]] - self.sum[[y, x + w]] - self.sum[[y + h, x]]
    }

    fn rect_sq_sum(&self, x: usize, y: usize, w: usize, h: usize) -> u64 {
        self.sq_sum[[y + h, x + w]] + self.sq_sum[[y, x]]
            - self.sq_sum[[y, x + w]]
            - self.sq_sum[[y + h, x]]
    }

    /// Standard deviation of the window, floored at 1 so a flat window
    /// never divides feature values by zero.
    pub fn window_stddev(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        let area = (w * h) as f64;
        let mean = self.rect_sum(x, y, w, h) as f64 / area;
        let variance = self.rect_sq_sum(x, y, w, h) as f64 / area - mean * mean;
        variance.max(1.0).sqrt()
    }
}
