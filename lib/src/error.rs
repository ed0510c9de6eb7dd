use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid value {value} for {register}: expected {expected}")]
    InvalidParameter { register: &'static str, value: i64, expected: &'static str },
    #[error("invalid display geometry {width}x{height}: expected 8..=128 columns and 8..=64 rows in multiples of 8")]
    InvalidGeometry { width: u32, height: u32 },
    #[error("frame is {actual_width}x{actual_height} but the display is {width}x{height}")]
    SizeMismatch { width: u32, height: u32, actual_width: u32, actual_height: u32 },
    #[error("invalid i2c bus id {0}")]
    InvalidBus(i32),
    #[error("unable to open i2c bus {}: {source}", .path.display())]
    BusUnavailable { path: PathBuf, source: std::io::Error },
    #[error("device address {address:#04x} was rejected: {source}")]
    AddressRejected { address: u8, source: std::io::Error },
    #[error("write of {len} bytes failed: {source}")]
    WriteFailed { len: usize, source: std::io::Error },
    #[error("unable to read from device: {0}")]
    ReadFailed(std::io::Error),
    #[error("the bus handle is already closed")]
    HandleClosed,
    #[error("the frame source failed: {0}")]
    FrameSource(Box<dyn std::error::Error + Send + Sync>),
    #[error("the renderer is not running")]
    NotRunning,
    #[error("the renderer was already started")]
    AlreadyStarted,
}

impl Error {
    /// os error code of the underlying transport failure, if there is one
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::BusUnavailable { source, .. }
            | Error::AddressRejected { source, .. }
            | Error::WriteFailed { source, .. }
            | Error::ReadFailed(source) => source.raw_os_error(),
            _ => None,
        }
    }

    /// whether the error was raised before any bus traffic happened
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidParameter { .. }
                | Error::InvalidGeometry { .. }
                | Error::SizeMismatch { .. }
                | Error::InvalidBus(_)
        )
    }
}

pub(crate) fn invalid(register: &'static str, value: impl Into<i64>, expected: &'static str) -> Error {
    Error::InvalidParameter { register, value: value.into(), expected }
}
