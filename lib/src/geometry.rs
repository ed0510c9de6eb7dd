use crate::error::Error;

pub const MAX_WIDTH: u32 = 128;
pub const MAX_HEIGHT: u32 = 64;
pub const PAGE_HEIGHT: u32 = 8;

/// size of the panel in pixels, only constructible with valid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    width: u32,
    height: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Result<Self, Error> {
        let width_ok = (1..=MAX_WIDTH).contains(&width) && width % 8 == 0;
        let height_ok = (1..=MAX_HEIGHT).contains(&height) && height % PAGE_HEIGHT == 0;
        if !width_ok || !height_ok {
            Err(Error::InvalidGeometry { width, height })?
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// number of 8 pixel high pages covering the panel
    pub fn pages(&self) -> u32 {
        self.height / PAGE_HEIGHT
    }

    /// length of a packed bitmap for this geometry including the control byte
    pub fn packed_len(&self) -> usize {
        (self.pages() * self.width) as usize + 1
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self { width: MAX_WIDTH, height: MAX_HEIGHT }
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_multiple_of_eight_in_range() {
        for width in (8..=128).step_by(8) {
            for height in (8..=64).step_by(8) {
                let geometry = Geometry::new(width, height).expect("geometry should be valid");
                assert_eq!(geometry.packed_len(), (height / 8 * width + 1) as usize);
            }
        }
    }

    #[test]
    fn rejects_invalid_dimensions() {
        for (width, height) in [(100, 64), (128, 10), (128, 72), (0, 64), (128, 0), (136, 64), (4, 8)] {
            assert!(matches!(Geometry::new(width, height), Err(Error::InvalidGeometry { .. })), "{width}x{height}");
        }
    }

    #[test]
    fn pages_cover_height() {
        let geometry = Geometry::new(128, 32).unwrap();
        assert_eq!(geometry.pages(), 4);
        assert_eq!(geometry.to_string(), "128x32");
    }
}
