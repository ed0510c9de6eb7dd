use std::path::{Path, PathBuf};

use log::{error, warn};
use serde::Deserialize;
use ssd1306_renderer_lib::{
    Error, SessionConfig,
    command::DEFAULT_ADDRESS,
    config::{DEFAULT_BUS_ID, DEFAULT_FPS},
    frame::DEFAULT_THRESHOLD,
    geometry::{MAX_HEIGHT, MAX_WIDTH},
};

use crate::cli::Cli;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    #[serde(skip_deserializing)]
    path: PathBuf,
    /// all config related to the panel itself
    pub display: DisplayConfig,
    /// where the display is attached
    pub bus: BusConfig,
    /// all config related to producing frames
    pub render: RenderConfig,
}

impl Config {
    /// load the config file at `path_str`, exits the process if the file is invalid
    pub fn new(path_str: &String) -> Self {
        match Self::load(path_str) {
            Ok(config) => config,
            Err(err) => {
                error!("invalid config file at {path_str}: {err}");
                std::process::exit(1)
            }
        }
    }

    /// like [`Config::new`] but hands invalid files back to the caller, a missing file is not an error
    pub fn load(path_str: &String) -> Result<Self, Box<dyn std::error::Error>> {
        let path = Path::new(path_str);
        if path.exists() {
            let str = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(str.as_str())?;
            Ok(Self { path: path.to_path_buf(), ..config })
        } else {
            warn!("missing config file at {path_str}, using default instead!");
            Ok(Self::default())
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or(self.path().as_path())
    }

    /// Expand `$HOME` and `~` at beginning of a path to
    /// current user home directory if resolvable
    fn expand_path(path_str: &str) -> Option<PathBuf> {
        if !path_str.starts_with('~') && !path_str.starts_with("$HOME") {
            Some(PathBuf::from(path_str))
        } else if path_str == "~" || path_str == "$HOME" {
            dirs::home_dir()
        } else {
            dirs::home_dir().map(|home| {
                let home_str = home.to_str().unwrap_or_default();
                let rest = path_str.trim_start_matches("$HOME").trim_start_matches('~').trim_start_matches('/');
                if home_str.is_empty() { PathBuf::from("/").join(rest) } else { Path::new(home_str).join(rest) }
            })
        }
    }

    /// Resolve relative paths to position of config file
    /// and expand `$HOME` and `~` to user home directory
    pub fn resolve_path(&self, path_str: &str) -> PathBuf {
        let path = match Self::expand_path(path_str) {
            Some(path) => path,
            None => {
                warn!("unable to resolve user home directory");
                PathBuf::from(path_str)
            }
        };

        if path.is_relative() {
            let full = self.directory().join(path);
            full.canonicalize().unwrap_or(full)
        } else {
            path
        }
    }

    /// override file values with everything given on the command line
    pub fn merge(&mut self, cli: &Cli) {
        if let Some(width) = cli.width {
            self.display.width = width;
        }
        if let Some(height) = cli.height {
            self.display.height = height;
        }
        if let Some(id) = cli.bus {
            self.bus.id = id;
        }
        if let Some(address) = cli.address {
            self.bus.address = address;
        }
        if let Some(fps) = cli.fps {
            self.render.fps = fps;
        }
        if let Some(threshold) = cli.threshold {
            self.render.threshold = threshold;
        }
    }

    /// the configured source, a source given on the command line is used as is
    pub fn source(&self, cli: &Cli) -> Option<PathBuf> {
        cli.source.clone().or_else(|| self.render.source.as_deref().map(|source| self.resolve_path(source)))
    }

    pub fn session(&self) -> Result<SessionConfig, Error> {
        SessionConfig::new(self.display.width, self.display.height, self.bus.id, self.bus.address, self.render.fps)
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    /// number of columns of the panel
    pub width: u32,
    /// number of rows of the panel
    pub height: u32,
    /// contrast applied after init, the controller default is kept when unset
    pub contrast: Option<u8>,
    /// swap lit and unlit pixels
    pub invert: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { width: MAX_WIDTH, height: MAX_HEIGHT, contrast: None, invert: false }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BusConfig {
    /// number of the i2c bus, `/dev/i2c-<id>`
    pub id: i32,
    /// 7-bit device address
    pub address: u8,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { id: DEFAULT_BUS_ID, address: DEFAULT_ADDRESS }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RenderConfig {
    pub fps: u32,
    /// luma level from which a source pixel is lit
    pub threshold: u8,
    /// how long every image of a still image or directory source is shown
    pub frame_duration_ms: u64,
    /// source shown when none is given on the command line
    ///
    /// relative paths are resolved against the location of the config file
    pub source: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { fps: DEFAULT_FPS, threshold: DEFAULT_THRESHOLD, frame_duration_ms: 1000, source: None }
    }
}
