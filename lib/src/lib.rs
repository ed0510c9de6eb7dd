//! Driver and frame pipeline for SSD1306 OLED displays attached through linux `i2c-dev`.

pub mod bus;
pub mod clock;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod frame;
pub mod geometry;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod packer;
pub mod renderer;

pub use bus::{Bus, I2cDev};
pub use config::SessionConfig;
pub use driver::Ssd1306;
pub use error::Error;
pub use frame::FrameSource;
pub use geometry::Geometry;
pub use renderer::{Renderer, Status};
