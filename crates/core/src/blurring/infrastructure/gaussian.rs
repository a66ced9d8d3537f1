//! Separable Gaussian blur over rectangular sub-grids of a packed
//! interleaved image.

/// Precompute a normalized 1D Gaussian kernel.
///
/// `size` must be odd and >= 1. Sigma is derived as `size / 6.0`, matching
/// OpenCV's convention for an unspecified sigma, so a 51-tap kernel blurs
/// like `GaussianBlur(..., (51, 51), 0)`.
pub fn kernel_1d(size: usize) -> Vec<f32> {
    debug_assert!(size >= 1 && size % 2 == 1, "kernel size must be odd");
    let sigma = size as f64 / 6.0;
    let half = (size / 2) as f64;
    let mut taps: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = taps.iter().sum();
    for t in &mut taps {
        *t /= total;
    }
    taps.iter().map(|&t| t as f32).collect()
}

/// Blur an interleaved `w x h x channels` buffer in place with the given
/// kernel, clamping at the edges. `scratch` is resized as needed and can
/// be reused across calls to avoid per-frame allocation.
pub fn blur_in_place(
    data: &mut [u8],
    w: usize,
    h: usize,
    channels: usize,
    kernel: &[f32],
    scratch: &mut Vec<f32>,
) {
    if kernel.len() <= 1 || w == 0 || h == 0 {
        return;
    }
    let half = kernel.len() / 2;
    scratch.resize(w * h * channels, 0.0);

    // Horizontal pass: data -> scratch.
    for y in 0..h {
        for x in 0..w {
            for c in 0..channels {
                let mut acc = 0.0f32;
                for (k, &tap) in kernel.iter().enumerate() {
                    let sx = (x + k).saturating_sub(half).min(w - 1);
                    acc += data[(y * w + sx) * channels + c] as f32 * tap;
                }
                scratch[(y * w + x) * channels + c] = acc;
            }
        }
    }

    // Vertical pass: scratch -> data.
    for y in 0..h {
        for x in 0..w {
            for c in 0..channels {
                let mut acc = 0.0f32;
                for (k, &tap) in kernel.iter().enumerate() {
                    let sy = (y + k).saturating_sub(half).min(h - 1);
                    acc += scratch[(sy * w + x) * channels + c] * tap;
                }
                data[(y * w + x) * channels + c] = acc.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
