use image::{DynamicImage, GrayImage, imageops::FilterType};
use ssd1306_renderer_lib::{Geometry, frame::threshold};

pub trait ImageExt {
    /// scale the image to exactly the display size and turn it black and white
    fn into_frame(self, geometry: Geometry, level: u8) -> GrayImage;
}

impl ImageExt for DynamicImage {
    fn into_frame(self, geometry: Geometry, level: u8) -> GrayImage {
        let resized = if self.width() == geometry.width() && self.height() == geometry.height() {
            self
        } else {
            self.resize_exact(geometry.width(), geometry.height(), FilterType::Triangle)
        };
        threshold(&resized, level)
    }
}

#[cfg(test)]
mod tests {
    use image::{Luma, RgbImage};

    use super::*;

    #[test]
    fn frames_match_display_size() {
        let geometry = Geometry::new(64, 32).unwrap();
        let frame = DynamicImage::ImageRgb8(RgbImage::new(300, 17)).into_frame(geometry, 128);
        assert_eq!(frame.dimensions(), (64, 32));
    }

    #[test]
    fn bright_images_stay_lit_after_scaling() {
        let geometry = Geometry::new(16, 8).unwrap();
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 16, Luma([200])));
        let frame = image.into_frame(geometry, 128);
        assert!(frame.pixels().all(|pixel| pixel.0[0] == 255));
        let frame = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 8, Luma([200]))).into_frame(geometry, 201);
        assert!(frame.pixels().all(|pixel| pixel.0[0] == 0));
    }
}
