use image::{GrayImage, Luma};
use proptest::prelude::*;
use ssd1306_renderer_lib::{Geometry, packer::pack};

fn geometry() -> impl Strategy<Value = Geometry> {
    (1_u32..=16, 1_u32..=8).prop_map(|(columns, pages)| Geometry::new(columns * 8, pages * 8).unwrap())
}

proptest! {
    #[test]
    fn every_lit_pixel_sets_exactly_its_bit(geometry in geometry(), seed in any::<u64>()) {
        let image = GrayImage::from_fn(geometry.width(), geometry.height(), |x, y| {
            let hash = (u64::from(x) * 31 + u64::from(y) * 17) ^ seed;
            if hash % 3 == 0 { Luma([255]) } else { Luma([0]) }
        });
        let bitmap = pack(&image, geometry).unwrap();

        prop_assert_eq!(bitmap.len(), geometry.packed_len());
        prop_assert_eq!(bitmap.as_bytes()[0], 0x40);
        for (x, y, pixel) in image.enumerate_pixels() {
            let tile = bitmap.tile(y / 8, x).unwrap();
            prop_assert_eq!(tile & (1 << (y % 8)) != 0, pixel.0[0] != 0);
        }
    }

    #[test]
    fn lit_pixel_count_is_preserved(geometry in geometry(), x in 0_u32..128, y in 0_u32..64) {
        let x = x % geometry.width();
        let y = y % geometry.height();
        let mut image = GrayImage::new(geometry.width(), geometry.height());
        image.put_pixel(x, y, Luma([1]));
        let bitmap = pack(&image, geometry).unwrap();

        let bits: u32 = bitmap.payload().iter().map(|byte| byte.count_ones()).sum();
        prop_assert_eq!(bits, 1);
        prop_assert_eq!(bitmap.tile(y / 8, x), Some(1 << (y % 8)));
    }
}
