//! Frame sources shown by the binary.
//!
//! All sources prepare their frames once when loaded, rendering only selects a frame by the
//! virtual time handed in by the renderer.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use image::{AnimationDecoder, DynamicImage, GrayImage, Luma, codecs::gif::GifDecoder};
use ssd1306_renderer_lib::{FrameSource, Geometry, frame::SourceError};

use crate::image::ImageExt;

/// gif frames without a delay are shown this long, like browsers do
const DEFAULT_GIF_DELAY: Duration = Duration::from_millis(100);
/// size of one checkerboard square in pixels
const PATTERN_SQUARE: u32 = 8;
/// time the test pattern needs to move by one pixel
const PATTERN_SPEED: Duration = Duration::from_millis(50);

/// Load the source at `path`, a gif is animated, a directory is shown image by image and
/// anything else is shown as a still image. Without a path the test pattern is shown.
pub fn load(
    path: Option<&Path>,
    geometry: Geometry,
    level: u8,
    frame_duration: Duration,
) -> Result<Box<dyn FrameSource>, SourceError> {
    let Some(path) = path else {
        log::info!("no source given, showing test pattern");
        return Ok(Box::new(TestPattern));
    };

    if path.is_dir() {
        Ok(Box::new(ImageSequence::from_directory(path, geometry, level, frame_duration)?))
    } else if is_gif(path) {
        Ok(Box::new(AnimatedGif::open(path, geometry, level)?))
    } else {
        Ok(Box::new(ImageSequence::still(path, geometry, level)?))
    }
}

fn is_gif(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("gif"))
}

/// still images, each shown for the same duration
pub struct ImageSequence {
    frames: Vec<GrayImage>,
    frame_duration: Duration,
}

impl ImageSequence {
    pub fn still(path: &Path, geometry: Geometry, level: u8) -> Result<Self, SourceError> {
        let image = image::open(path).map_err(|err| format!("unable to open image {}: {err}", path.display()))?;
        log::debug!("loaded still image {}", path.display());
        Ok(Self { frames: vec![image.into_frame(geometry, level)], frame_duration: Duration::MAX })
    }

    /// every readable image of `dir` in file name order, unreadable files are skipped
    pub fn from_directory(
        dir: &Path,
        geometry: Geometry,
        level: u8,
        frame_duration: Duration,
    ) -> Result<Self, SourceError> {
        if frame_duration.is_zero() {
            Err("frame duration must not be zero")?
        }

        let mut paths = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file())
            .collect::<Vec<PathBuf>>();
        paths.sort();

        let frames = paths
            .iter()
            .filter_map(|path| match image::open(path) {
                Ok(image) => Some(image.into_frame(geometry, level)),
                Err(err) => {
                    log::warn!("skipping {}: {err}", path.display());
                    None
                }
            })
            .collect::<Vec<_>>();

        if frames.is_empty() {
            Err(format!("no readable images in {}", dir.display()))?
        }
        log::debug!("loaded {} images from {}", frames.len(), dir.display());
        Ok(Self { frames, frame_duration })
    }

    pub fn from_frames(frames: Vec<GrayImage>, frame_duration: Duration) -> Result<Self, SourceError> {
        if frames.is_empty() || frame_duration.is_zero() {
            Err("an image sequence needs at least one frame and a frame duration")?
        }
        Ok(Self { frames, frame_duration })
    }
}

impl FrameSource for ImageSequence {
    fn render(&mut self, elapsed: Duration, _geometry: Geometry) -> Result<GrayImage, SourceError> {
        let index = (elapsed.as_nanos() / self.frame_duration.as_nanos()) % self.frames.len() as u128;
        Ok(self.frames[index as usize].clone())
    }
}

/// the frames of an animated gif, played in a loop with their own delays
pub struct AnimatedGif {
    /// end of each frame measured from the start of the animation
    frames: Vec<(Duration, GrayImage)>,
    total: Duration,
}

impl AnimatedGif {
    pub fn open(path: &Path, geometry: Geometry, level: u8) -> Result<Self, SourceError> {
        let reader = BufReader::new(File::open(path)?);
        let decoder = GifDecoder::new(reader)?;
        let frames = decoder.into_frames().collect_frames()?;

        let frames = frames
            .into_iter()
            .map(|frame| {
                let (numerator, denominator) = frame.delay().numer_denom_ms();
                let delay = Duration::from_millis(u64::from(numerator) / u64::from(denominator.max(1)));
                (delay, DynamicImage::ImageRgba8(frame.into_buffer()).into_frame(geometry, level))
            })
            .collect::<Vec<_>>();
        log::debug!("loaded {} gif frames from {}", frames.len(), path.display());
        Self::from_frames(frames)
    }

    /// build from `(delay, frame)` pairs, frames without a delay are shown for 100ms
    pub fn from_frames(frames: Vec<(Duration, GrayImage)>) -> Result<Self, SourceError> {
        if frames.is_empty() {
            Err("gif does not contain any frames")?
        }

        let mut total = Duration::ZERO;
        let frames = frames
            .into_iter()
            .map(|(delay, frame)| {
                total += if delay.is_zero() { DEFAULT_GIF_DELAY } else { delay };
                (total, frame)
            })
            .collect();
        Ok(Self { frames, total })
    }

    pub fn total(&self) -> Duration {
        self.total
    }
}

impl FrameSource for AnimatedGif {
    fn render(&mut self, elapsed: Duration, _geometry: Geometry) -> Result<GrayImage, SourceError> {
        let position = Duration::from_nanos((elapsed.as_nanos() % self.total.as_nanos()) as u64);
        let index = self.frames.partition_point(|(end, _)| *end <= position);
        let (_, frame) = &self.frames[index.min(self.frames.len() - 1)];
        Ok(frame.clone())
    }
}

/// checkerboard moving one pixel to the left every 50ms
pub struct TestPattern;

impl FrameSource for TestPattern {
    fn render(&mut self, elapsed: Duration, geometry: Geometry) -> Result<GrayImage, SourceError> {
        let shift = (elapsed.as_millis() / PATTERN_SPEED.as_millis()) as u32 % (2 * PATTERN_SQUARE);
        Ok(GrayImage::from_fn(geometry.width(), geometry.height(), |x, y| {
            let lit = ((x + shift) / PATTERN_SQUARE + y / PATTERN_SQUARE) % 2 == 0;
            if lit { Luma([u8::MAX]) } else { Luma([0]) }
        }))
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    fn geometry() -> Geometry {
        Geometry::new(32, 16).unwrap()
    }

    fn solid(value: u8) -> GrayImage {
        GrayImage::from_pixel(32, 16, Luma([value]))
    }

    #[test]
    fn sequence_advances_with_frame_duration() {
        let mut source = ImageSequence::from_frames(vec![solid(0), solid(255)], Duration::from_millis(500)).unwrap();
        let at = |source: &mut ImageSequence, ms| source.render(Duration::from_millis(ms), geometry()).unwrap();
        assert_eq!(at(&mut source, 0), solid(0));
        assert_eq!(at(&mut source, 499), solid(0));
        assert_eq!(at(&mut source, 500), solid(255));
        assert_eq!(at(&mut source, 1000), solid(0));
    }

    #[test]
    fn sequence_handles_sub_millisecond_durations() {
        let mut source = ImageSequence::from_frames(vec![solid(0), solid(255)], Duration::from_micros(500)).unwrap();
        assert_eq!(source.render(Duration::from_millis(10), geometry()).unwrap(), solid(0));
        assert_eq!(source.render(Duration::from_micros(1500), geometry()).unwrap(), solid(255));
    }

    #[test]
    fn gif_frames_follow_cumulative_delays() {
        let frames = vec![
            (Duration::from_millis(100), solid(1)),
            (Duration::ZERO, solid(2)),
            (Duration::from_millis(300), solid(3)),
        ];
        let mut source = AnimatedGif::from_frames(frames).unwrap();
        assert_eq!(source.total(), Duration::from_millis(500));

        let at = |source: &mut AnimatedGif, ms| source.render(Duration::from_millis(ms), geometry()).unwrap();
        assert_eq!(at(&mut source, 0), solid(1));
        assert_eq!(at(&mut source, 99), solid(1));
        assert_eq!(at(&mut source, 100), solid(2));
        assert_eq!(at(&mut source, 250), solid(3));
        assert_eq!(at(&mut source, 500), solid(1));
        assert_eq!(at(&mut source, 1199), solid(2));
    }

    #[test]
    fn test_pattern_depends_only_on_elapsed() {
        let mut source = TestPattern;
        let first = source.render(Duration::from_millis(150), geometry()).unwrap();
        let second = source.render(Duration::from_millis(150), geometry()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.dimensions(), (32, 16));

        let start = source.render(Duration::ZERO, geometry()).unwrap();
        assert_ne!(start, first);
        // one full period of the pattern brings it back to the start
        assert_eq!(source.render(Duration::from_millis(800), geometry()).unwrap(), start);
    }

    #[test]
    fn directory_sources_load_sorted_images_and_skip_others() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(4, 4, Rgb([255, 255, 255])).save(dir.path().join("b.png")).unwrap();
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])).save(dir.path().join("a.png")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let mut source = load(Some(dir.path()), geometry(), 128, Duration::from_millis(100)).unwrap();
        let first = source.render(Duration::ZERO, geometry()).unwrap();
        let second = source.render(Duration::from_millis(100), geometry()).unwrap();
        assert!(first.pixels().all(|pixel| pixel.0[0] == 0));
        assert!(second.pixels().all(|pixel| pixel.0[0] == 255));
        assert_eq!(first.dimensions(), (32, 16));
    }

    #[test]
    fn still_image_never_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        RgbImage::from_pixel(64, 32, Rgb([255, 255, 255])).save(&path).unwrap();

        let mut source = load(Some(&path), geometry(), 128, Duration::from_millis(100)).unwrap();
        let frame = source.render(Duration::ZERO, geometry()).unwrap();
        assert_eq!(source.render(Duration::from_secs(3600), geometry()).unwrap(), frame);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(dir.path()), geometry(), 128, Duration::from_millis(100)).is_err());
        assert!(load(Some(&dir.path().join("missing.png")), geometry(), 128, Duration::from_millis(100)).is_err());
    }
}
