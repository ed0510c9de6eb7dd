use std::{process::ExitCode, time::Duration};

use clap::Parser;
use log::{error, info};
use ssd1306_renderer_lib::{Bus, Error, FrameSource, I2cDev, Renderer};
use tokio::{
    signal::unix::{SignalKind, signal},
    time::MissedTickBehavior,
};

use crate::{
    cli::Cli,
    config::{Config, DisplayConfig},
};

mod cli;
mod config;
mod image;
mod source;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = Config::new(&cli.config);
    config.merge(&cli);

    let session = match config.session() {
        Ok(session) => session,
        Err(err) => {
            error!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let source_path = config.source(&cli);
    let frame_duration = Duration::from_millis(config.render.frame_duration_ms);
    let threshold = config.render.threshold;
    let source = match source::load(source_path.as_deref(), session.geometry(), threshold, frame_duration) {
        Ok(source) => source,
        Err(err) => {
            error!("unable to load frame source: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut renderer = Renderer::new(session, source);
    if let Err(err) = renderer.start(I2cDev::open) {
        error!("unable to start display: {err}");
        return ExitCode::FAILURE;
    }
    if let Err(err) = apply_display_config(&mut renderer, &config.display) {
        error!("unable to configure display: {err}");
        renderer.teardown();
        return ExitCode::FAILURE;
    }

    let result = run(&mut renderer).await;
    renderer.teardown();
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("rendering stopped: {err}");
            ExitCode::FAILURE
        }
    }
}

fn apply_display_config<B: Bus, S: FrameSource>(
    renderer: &mut Renderer<B, S>,
    display: &DisplayConfig,
) -> Result<(), Error> {
    let Some(driver) = renderer.driver_mut() else {
        return Err(Error::NotRunning);
    };
    if let Some(contrast) = display.contrast {
        driver.set_contrast(contrast)?;
    }
    if display.invert {
        driver.set_inverse(true)?;
    }
    Ok(())
}

/// tick the renderer until it fails or the process is asked to stop
async fn run<B: Bus, S: FrameSource>(renderer: &mut Renderer<B, S>) -> Result<(), Error> {
    let mut interval = tokio::time::interval(renderer.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => Some(terminate),
        Err(err) => {
            log::warn!("unable to listen for SIGTERM: {err}");
            None
        }
    };
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => renderer.tick()?,
            _ = &mut ctrl_c => {
                info!("received interrupt, shutting down");
                return Ok(());
            }
            Some(()) = async { terminate.as_mut()?.recv().await } => {
                info!("received SIGTERM, shutting down");
                return Ok(());
            }
        }
    }
}
