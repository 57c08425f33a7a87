use std::time::Duration;

use ini::Ini;

use crate::key::DEFAULT_KEY_BITS;

/// Tunable constants controlling ring width and protocol timing. An
/// optional `rust-ini` file can override any of them, and CLI flags in turn
/// override the file.
#[derive(Clone, Debug)]
pub struct Config {
    pub key_bits: u32,
    pub stabilize_interval: Duration,
    pub successor_list_size: usize,
    pub liveness_timeout: Duration,
    pub dev_mode: bool,
}

const DEFAULT_STABILIZE_MILLIS: u64 = 4_000;
const DEFAULT_SUCCESSOR_LIST_SIZE: usize = 2;
const DEFAULT_LIVENESS_TIMEOUT_MILLIS: u64 = 500;

impl Default for Config {
    fn default() -> Self {
        Config {
            key_bits: DEFAULT_KEY_BITS,
            stabilize_interval: Duration::from_millis(DEFAULT_STABILIZE_MILLIS),
            successor_list_size: DEFAULT_SUCCESSOR_LIST_SIZE,
            liveness_timeout: Duration::from_millis(DEFAULT_LIVENESS_TIMEOUT_MILLIS),
            dev_mode: false,
        }
    }
}

impl Config {
    /// Loads overrides from an ini file under the `[chord]` section, falling
    /// back to spec defaults for any key that's absent. Missing files are not
    /// an error: the config path is optional.
    pub fn from_ini_file(path: &str) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = Config::default();
        let ini = Ini::load_from_file(path)?;
        let section = ini.section(Some("chord"));

        if let Some(section) = section {
            if let Some(v) = section.get("key_bits") {
                config.key_bits = v.parse()?;
            }
            if let Some(v) = section.get("stabilize_interval_millis") {
                config.stabilize_interval = Duration::from_millis(v.parse()?);
            }
            if let Some(v) = section.get("successor_list_size") {
                config.successor_list_size = v.parse()?;
            }
            if let Some(v) = section.get("liveness_timeout_millis") {
                config.liveness_timeout = Duration::from_millis(v.parse()?);
            }
            if let Some(v) = section.get("dev_mode") {
                config.dev_mode = v.parse()?;
            }
        }
        Ok(config)
    }
}
