//! Render-and-transmit loop.
//!
//! The renderer owns the driver, and with it the bus, for the whole session. It does not own a
//! timer: whoever drives it calls [`Renderer::tick`] once per [`Renderer::interval`].

use std::time::Duration;

use crate::{
    bus::Bus, clock::FrameClock, config::SessionConfig, driver::Ssd1306, error::Error, frame::FrameSource,
    packer::pack,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotRunning,
    Running,
    /// terminal, a new renderer is needed to show frames again
    Stopped,
}

pub struct Renderer<B: Bus, S: FrameSource> {
    config: SessionConfig,
    source: S,
    clock: FrameClock,
    driver: Option<Ssd1306<B>>,
    status: Status,
}

impl<B: Bus, S: FrameSource> Renderer<B, S> {
    pub fn new(config: SessionConfig, source: S) -> Self {
        Self { config, source, clock: FrameClock::new(config.interval()), driver: None, status: Status::NotRunning }
    }

    /// Open the bus with `open`, select the device and bring the display up blank.
    ///
    /// On failure the bus is closed again and the renderer is stopped for good.
    pub fn start<F>(&mut self, open: F) -> Result<(), Error>
    where
        F: FnOnce(i32) -> Result<B, Error>,
    {
        if self.status != Status::NotRunning {
            Err(Error::AlreadyStarted)?
        }

        let mut bus = match open(self.config.bus_id()) {
            Ok(bus) => bus,
            Err(err) => {
                self.status = Status::Stopped;
                return Err(err);
            }
        };
        if let Err(err) = bus.select(self.config.address()) {
            bus.close();
            self.status = Status::Stopped;
            return Err(err);
        }

        let mut driver = Ssd1306::new(bus);
        let geometry = self.config.geometry();
        let result = driver.init(geometry.width(), geometry.height());
        if let Err(err) = result.and_then(|_| driver.clear(geometry.width(), geometry.height())) {
            driver.close();
            self.status = Status::Stopped;
            return Err(err);
        }

        log::info!(
            "started {geometry} display at {:#04x} on bus {} with {} fps",
            self.config.address(),
            self.config.bus_id(),
            self.config.fps()
        );
        self.driver = Some(driver);
        self.status = Status::Running;
        Ok(())
    }

    /// Render, pack and send one frame, then advance the clock.
    ///
    /// Any failure stops the session and the clock keeps the time of the failed frame.
    pub fn tick(&mut self) -> Result<(), Error> {
        if self.status != Status::Running {
            Err(Error::NotRunning)?
        }
        let Some(driver) = self.driver.as_mut() else {
            return Err(Error::NotRunning);
        };

        let geometry = self.config.geometry();
        let result = self
            .source
            .render(self.clock.elapsed(), geometry)
            .map_err(Error::FrameSource)
            .and_then(|image| pack(&image, geometry))
            .and_then(|bitmap| driver.write_frame(&bitmap));

        if let Err(err) = result {
            log::error!("frame {} failed, stopping: {err}", self.clock.frames());
            self.status = Status::Stopped;
            return Err(err);
        }

        self.clock.advance();
        Ok(())
    }

    /// Stop the session, blank the display and close the bus. Calling this more than once is fine.
    pub fn teardown(&mut self) {
        self.status = Status::Stopped;
        let Some(mut driver) = self.driver.take() else {
            return;
        };

        let geometry = self.config.geometry();
        if let Err(err) = driver.clear(geometry.width(), geometry.height()) {
            log::warn!("unable to clear display during teardown: {err}");
        }
        driver.close();
        log::debug!("tore down session after {} frames", self.clock.frames());
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn interval(&self) -> Duration {
        self.config.interval()
    }

    /// the driver of a started session, for adjustments like contrast after start
    pub fn driver_mut(&mut self) -> Option<&mut Ssd1306<B>> {
        self.driver.as_mut()
    }
}

impl<B: Bus, S: FrameSource> Drop for Renderer<B, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
