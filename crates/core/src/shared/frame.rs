use ndarray::{ArrayView3, ArrayViewMut3};

/// A single decoded video frame: contiguous BGR bytes in row-major order.
///
/// The byte layout is exactly what the encoding sink consumes — blue,
/// green, red per pixel, rows packed without padding — so `data()` doubles
/// as the wire serialization. Each frame is owned exclusively by one
/// pipeline iteration and discarded after it is written out.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: u64,
}

/// Channels per pixel. The pipeline only handles packed 3-channel BGR.
pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// A black frame of the given geometry, mostly useful in tests.
    pub fn black(width: u32, height: u32, index: u64) -> Self {
        Self::new(
            vec![0; width as usize * height as usize * CHANNELS],
            width,
            height,
            index,
        )
    }

    /// Raw bytes in sink order: row-major, BGR, no padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Position of this frame in read order, starting at 0.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let off = self.offset(x, y);
        [self.data[off], self.data[off + 1], self.data[off + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, bgr: [u8; 3]) {
        let off = self.offset(x, y);
        self.data[off..off + CHANNELS].copy_from_slice(&bgr);
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("frame data length must match dimensions")
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}
