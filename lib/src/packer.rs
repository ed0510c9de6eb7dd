use image::GrayImage;

use crate::{command::CONTROL_DATA, error::Error, geometry::Geometry};

/// A full frame in the page addressed layout of the display ram, ready to be sent.
///
/// Byte 0 is always the data control byte, followed by one byte per (page, column) pair in
/// page-major order. Bit `i` of a byte is row `page * 8 + i`, so the least significant bit is
/// the topmost pixel of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBitmap {
    geometry: Geometry,
    bytes: Vec<u8>,
}

impl PackedBitmap {
    /// a bitmap with every pixel off
    pub fn blank(geometry: Geometry) -> Self {
        let mut bytes = vec![0_u8; geometry.packed_len()];
        bytes[0] = CONTROL_DATA;
        Self { geometry, bytes }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// the complete data frame including the control byte
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// the pixel bytes without the control byte
    pub fn payload(&self) -> &[u8] {
        &self.bytes[1..]
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_blank(&self) -> bool {
        self.payload().iter().all(|byte| *byte == 0)
    }

    /// the 8 pixel tall column of `page` at `column`
    pub fn tile(&self, page: u32, column: u32) -> Option<u8> {
        if page >= self.geometry.pages() || column >= self.geometry.width() {
            return None;
        }
        self.bytes.get(1 + (page * self.geometry.width() + column) as usize).copied()
    }
}

/// pack a thresholded image into the page layout, any non-zero luma counts as a lit pixel
pub fn pack(image: &GrayImage, geometry: Geometry) -> Result<PackedBitmap, Error> {
    if image.width() != geometry.width() || image.height() != geometry.height() {
        Err(Error::SizeMismatch {
            width: geometry.width(),
            height: geometry.height(),
            actual_width: image.width(),
            actual_height: image.height(),
        })?
    }

    let mut bytes = Vec::with_capacity(geometry.packed_len());
    bytes.push(CONTROL_DATA);
    for page in 0..geometry.pages() {
        for x in 0..geometry.width() {
            let tile = (0..8).fold(0_u8, |tile, bit| {
                let lit = image.get_pixel(x, page * 8 + bit).0[0] != 0;
                tile | (u8::from(lit) << bit)
            });
            bytes.push(tile);
        }
    }

    Ok(PackedBitmap { geometry, bytes })
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    fn geometry() -> Geometry {
        Geometry::new(128, 64).unwrap()
    }

    #[test]
    fn black_image_packs_to_zeroes() {
        let bitmap = pack(&GrayImage::new(128, 64), geometry()).unwrap();
        assert_eq!(bitmap.len(), 1025);
        assert_eq!(bitmap.as_bytes()[0], 0x40);
        assert!(bitmap.payload().iter().all(|byte| *byte == 0x00));
        assert_eq!(bitmap, PackedBitmap::blank(geometry()));
    }

    #[test]
    fn white_image_packs_to_ones() {
        let image = GrayImage::from_pixel(128, 64, Luma([255]));
        let bitmap = pack(&image, geometry()).unwrap();
        assert_eq!(bitmap.as_bytes()[0], 0x40);
        assert!(bitmap.payload().iter().all(|byte| *byte == 0xff));
    }

    #[test]
    fn topmost_row_is_least_significant_bit() {
        let mut image = GrayImage::new(128, 64);
        image.put_pixel(0, 0, Luma([255]));
        assert_eq!(pack(&image, geometry()).unwrap().tile(0, 0), Some(0x01));

        let mut image = GrayImage::new(128, 64);
        image.put_pixel(0, 7, Luma([255]));
        assert_eq!(pack(&image, geometry()).unwrap().tile(0, 0), Some(0x80));
    }

    #[test]
    fn second_page_follows_first_page_columns() {
        let geometry = Geometry::new(16, 16).unwrap();
        let mut image = GrayImage::new(16, 16);
        image.put_pixel(3, 9, Luma([1]));
        let bitmap = pack(&image, geometry).unwrap();
        assert_eq!(bitmap.as_bytes()[1 + 16 + 3], 0x02);
        assert_eq!(bitmap.payload().iter().filter(|byte| **byte != 0).count(), 1);
    }

    #[test]
    fn mismatched_size_is_rejected() {
        for (width, height) in [(127, 64), (128, 63), (64, 128), (0, 0)] {
            let err = pack(&GrayImage::new(width, height), geometry()).unwrap_err();
            assert!(matches!(
                err,
                Error::SizeMismatch { actual_width, actual_height, .. } if actual_width == width && actual_height == height
            ));
        }
    }

    #[test]
    fn tile_outside_bitmap_is_none() {
        let bitmap = PackedBitmap::blank(geometry());
        assert_eq!(bitmap.tile(8, 0), None);
        assert_eq!(bitmap.tile(0, 128), None);
        assert_eq!(bitmap.tile(7, 127), Some(0));
    }
}
