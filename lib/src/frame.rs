use std::time::Duration;

use image::{DynamicImage, GrayImage, Luma};

use crate::geometry::Geometry;

pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// luma level at and above which a pixel is lit
pub const DEFAULT_THRESHOLD: u8 = 128;

/// Produces the raster frames shown on the display.
///
/// `render` is called once per tick with the virtual time of the frame and must return an image
/// of exactly the display geometry, thresholded so that lit pixels have a non-zero luma.
pub trait FrameSource {
    fn render(&mut self, elapsed: Duration, geometry: Geometry) -> Result<GrayImage, SourceError>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn render(&mut self, elapsed: Duration, geometry: Geometry) -> Result<GrayImage, SourceError> {
        (**self).render(elapsed, geometry)
    }
}

/// convert an image to black and white, pixels with a luma of at least `level` become white
pub fn threshold(image: &DynamicImage, level: u8) -> GrayImage {
    let mut gray = image.to_luma8();
    gray.pixels_mut().for_each(|pixel| {
        *pixel = if pixel.0[0] >= level { Luma([u8::MAX]) } else { Luma([0]) };
    });
    gray
}
