use std::cell::RefCell;

use crate::blurring::domain::frame_blurrer::FrameBlurrer;
use crate::blurring::infrastructure::gaussian;
use crate::shared::constants::BLUR_KERNEL_SIZE;
use crate::shared::error::StreamError;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Redacts face regions with a strong separable Gaussian blur.
///
/// The kernel is computed once at construction; per-frame work is copy
/// out, blur, copy back for each region, with scratch buffers reused
/// across frames. The 51-tap default is large relative to any resolvable
/// facial feature, so identity-bearing detail is destroyed regardless of
/// the face's scale in the frame.
pub struct GaussianRegionBlurrer {
    kernel: Vec<f32>,
    roi: RefCell<Vec<u8>>,
    scratch: RefCell<Vec<f32>>,
}

impl GaussianRegionBlurrer {
    pub fn new(kernel_size: usize) -> Self {
        Self {
            kernel: gaussian::kernel_1d(kernel_size),
            roi: RefCell::new(Vec::new()),
            scratch: RefCell::new(Vec::new()),
        }
    }
}

impl Default for GaussianRegionBlurrer {
    fn default() -> Self {
        Self::new(BLUR_KERNEL_SIZE)
    }
}

impl FrameBlurrer for GaussianRegionBlurrer {
    fn blur(&self, frame: &mut Frame, regions: &[Region]) -> Result<(), StreamError> {
        let frame_w = frame.width() as usize;
        let channels = crate::shared::frame::CHANNELS;
        let data = frame.data_mut();

        let mut roi = self.roi.borrow_mut();
        let mut scratch = self.scratch.borrow_mut();

        for region in regions {
            debug_assert!(
                region.x >= 0 && region.y >= 0 && region.width > 0 && region.height > 0,
                "regions must be clamped before blurring"
            );
            let rx = region.x as usize;
            let ry = region.y as usize;
            let rw = region.width as usize;
            let rh = region.height as usize;
            let row_bytes = rw * channels;

            roi.resize(rw * rh * channels, 0);
            for row in 0..rh {
                let src = ((ry + row) * frame_w + rx) * channels;
                roi[row * row_bytes..(row + 1) * row_bytes]
                    .copy_from_slice(&data[src..src + row_bytes]);
            }

            gaussian::blur_in_place(&mut roi, rw, rh, channels, &self.kernel, &mut scratch);

            for row in 0..rh {
                let dst = ((ry + row) * frame_w + rx) * channels;
                data[dst..dst + row_bytes]
                    .copy_from_slice(&roi[row * row_bytes..(row + 1) * row_bytes]);
            }
        }

        Ok(())
    }
}
