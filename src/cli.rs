use std::path::{Path, PathBuf};

use clap::Parser;

const CONFIG_PATH: &str = ".config/ssd1306-renderer/config.toml";

#[derive(Parser, Debug)]
#[command(version = env!("GIT_VERSION"), about)]
pub struct Cli {
    /// Image file, directory of images or animated gif to show, a test pattern is shown when omitted
    pub source: Option<PathBuf>,

    #[arg(long, short = 'W')]
    /// Width of the display in pixels
    pub width: Option<u32>,

    #[arg(long, short = 'H')]
    /// Height of the display in pixels
    pub height: Option<u32>,

    #[arg(long, short)]
    /// Number of the i2c bus, selects /dev/i2c-<bus>
    pub bus: Option<i32>,

    #[arg(long, short, value_parser = parse_address)]
    /// 7-bit device address, accepts decimal and 0x prefixed hex
    pub address: Option<u8>,

    #[arg(long, short)]
    /// Frames per second
    pub fps: Option<u32>,

    #[arg(long, short)]
    /// Luma level from which a source pixel is lit
    pub threshold: Option<u8>,

    #[arg(long, short, default_value_t = get_default_config_path())]
    /// Alternative path to a config file
    pub config: String,
}

fn get_default_config_path() -> String {
    let home_dir = dirs::home_dir().unwrap_or_default();
    let path = home_dir.join(Path::new(CONFIG_PATH));
    String::from(path.to_str().unwrap_or_default())
}

pub fn parse_address(value: &str) -> Result<u8, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse::<u8>(),
    };
    match parsed {
        Ok(address) if address <= 0x7f => Ok(address),
        Ok(address) => Err(format!("{address:#04x} is not a 7-bit address")),
        Err(err) => Err(format!("invalid address {value}: {err}")),
    }
}
