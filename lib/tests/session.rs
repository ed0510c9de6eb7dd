use std::time::Duration;

use image::{GrayImage, Luma};
use ssd1306_renderer_lib::{
    Error, FrameSource, Geometry, Renderer, SessionConfig, Ssd1306, Status,
    command::{CONTROL_DATA, opcode},
    frame::SourceError,
    mock::{INJECTED_ERRNO, RecordingBus},
    packer::pack,
};

/// fixed checkerboard of 8x8 squares
struct Checkerboard;

impl FrameSource for Checkerboard {
    fn render(&mut self, _elapsed: Duration, geometry: Geometry) -> Result<GrayImage, SourceError> {
        Ok(GrayImage::from_fn(geometry.width(), geometry.height(), |x, y| {
            if (x / 8 + y / 8) % 2 == 0 { Luma([255]) } else { Luma([0]) }
        }))
    }
}

#[test]
fn init_and_clear_for_every_geometry() {
    for width in (8..=128).step_by(8) {
        for height in (8..=64).step_by(8) {
            let (bus, recorder) = RecordingBus::new();
            let mut driver = Ssd1306::new(bus);
            driver.init(width, height).unwrap();
            driver.clear(width, height).unwrap();

            let writes = recorder.writes();
            assert_eq!(writes.len(), 57, "{width}x{height}");
            let clear = &writes[56];
            assert_eq!(clear.len(), (height / 8 * width + 1) as usize);
            assert_eq!(clear[0], CONTROL_DATA);
            assert!(clear[1..].iter().all(|byte| *byte == 0));
        }
    }
}

#[test]
fn invalid_geometry_issues_no_writes() {
    for (width, height) in [(100, 64), (128, 10), (128, 72), (0, 8), (136, 8)] {
        let (bus, recorder) = RecordingBus::new();
        let mut driver = Ssd1306::new(bus);
        assert!(matches!(driver.init(width, height), Err(Error::InvalidGeometry { .. })));
        assert!(matches!(driver.clear(width, height), Err(Error::InvalidGeometry { .. })));
        assert_eq!(recorder.attempts(), 0);
    }
}

#[test]
fn soft_reset_fails_fast_on_third_write() {
    let (bus, recorder) = RecordingBus::new();
    let mut driver = Ssd1306::new(bus.fail_write_at(3));

    let err = driver.soft_reset().unwrap_err();
    assert_eq!(err.raw_os_error(), Some(INJECTED_ERRNO));
    assert!(!err.is_validation());
    assert!(matches!(err, Error::WriteFailed { len: 2, .. }));
    assert_eq!(recorder.attempts(), 3);
    // the failing write was the third flush no-op, only the first two went out
    assert_eq!(recorder.writes(), vec![vec![0x00, opcode::NOP]; 2]);
}

#[test]
fn checkerboard_frames_alternate_with_clock_advances() {
    let config = SessionConfig::new(128, 64, 2, 0x3c, 10).unwrap();
    let expected = pack(&Checkerboard.render(Duration::ZERO, config.geometry()).unwrap(), config.geometry()).unwrap();

    let (bus, recorder) = RecordingBus::new();
    let mut renderer = Renderer::new(config, Checkerboard);
    renderer.start(|_| Ok(bus)).unwrap();
    let after_start = recorder.data_writes().len();
    assert_eq!(after_start, 1);

    for k in 1..=5_u32 {
        renderer.tick().unwrap();
        let data = recorder.data_writes();
        assert_eq!(data.len(), after_start + k as usize);
        assert_eq!(data.last().unwrap().as_slice(), expected.as_bytes());
        assert_eq!(renderer.clock().frames(), u64::from(k));
        assert_eq!(renderer.clock().elapsed(), renderer.interval() * k);
    }

    renderer.teardown();
    assert_eq!(renderer.status(), Status::Stopped);
    assert!(recorder.is_closed());
    assert!(recorder.data_writes().last().unwrap()[1..].iter().all(|byte| *byte == 0));
}
