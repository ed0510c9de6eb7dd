use std::time::Duration;

use crate::{
    bus::MAX_ADDRESS,
    error::{Error, invalid},
    geometry::Geometry,
};

pub const DEFAULT_BUS_ID: i32 = 2;
pub const DEFAULT_FPS: u32 = 10;
pub const MAX_FPS: u32 = 1000;

/// Parameters of a rendering session, validated once before anything touches the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    geometry: Geometry,
    bus_id: i32,
    address: u8,
    fps: u32,
}

impl SessionConfig {
    pub fn new(width: u32, height: u32, bus_id: i32, address: u8, fps: u32) -> Result<Self, Error> {
        let geometry = Geometry::new(width, height)?;
        if bus_id < 0 {
            Err(Error::InvalidBus(bus_id))?
        }
        if address > MAX_ADDRESS {
            Err(invalid("device address", address, "a 7-bit address up to 0x7f"))?
        }
        if !(1..=MAX_FPS).contains(&fps) {
            Err(invalid("fps", fps, "1 to 1000 frames per second"))?
        }
        Ok(Self { geometry, bus_id, address, fps })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn bus_id(&self) -> i32 {
        self.bus_id
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// time between two frames in whole milliseconds, also the step of the frame clock
    pub fn interval(&self) -> Duration {
        Duration::from_millis(u64::from(1000 / self.fps))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            bus_id: DEFAULT_BUS_ID,
            address: crate::command::DEFAULT_ADDRESS,
            fps: DEFAULT_FPS,
        }
    }
}
