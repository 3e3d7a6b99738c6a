//! Host option strings
//!
//! Options are given as `key=value` pairs separated by commas, for example
//! `instance=0,divider=20,mode=1`. Unknown keys are logged and ignored.
//!
//! | Key        | Meaning                                  | Default |
//! |------------|------------------------------------------|---------|
//! | `instance` | SSI instance, 0 to 5                     | 0       |
//! | `divider`  | BAUDR divisor of 200 MHz, even, >= 2     | 20      |
//! | `mode`     | SPI mode 0 to 3                          | 1       |
//! | `pins`     | route GPIO 8..11 to SPI0 (`yes`/`no`)    | yes     |
//! | `timeout`  | read deadline in ms, 0 waits forever     | 1000    |

use std::time::Duration;

use rp1spi_core::{SpiConfig, SpiMode};

use crate::error::{Result, Rp1Error};
use crate::rp1::MAX_GPIO_INSTANCE;

/// Default read deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Parsed host options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOptions {
    /// SSI instance number
    pub instance: u8,
    /// Controller configuration
    pub config: SpiConfig,
    /// Route the SPI0 pins before use
    pub select_pins: bool,
    /// Read deadline; `None` blocks until the peer clocks every frame
    pub timeout: Option<Duration>,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            instance: 0,
            config: SpiConfig::default(),
            select_pins: true,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// Split `key=value,key=value` into pairs, skipping entries without `=`
pub fn split_options(s: &str) -> Vec<(&str, &str)> {
    s.split(',')
        .filter(|opt| !opt.is_empty())
        .filter_map(|opt| opt.split_once('='))
        .collect()
}

/// Build [`HostOptions`] from key/value pairs
pub fn parse_options(options: &[(&str, &str)]) -> Result<HostOptions> {
    let mut opts = HostOptions::default();

    for (key, value) in options {
        match *key {
            "instance" => {
                let instance: u8 = value
                    .parse()
                    .map_err(|_| invalid(format!("Invalid instance value: {}", value)))?;
                if instance > MAX_GPIO_INSTANCE {
                    return Err(Rp1Error::InstanceUnavailable(instance));
                }
                opts.instance = instance;
            }
            "divider" => {
                let divider: u16 = value
                    .parse()
                    .map_err(|_| invalid(format!("Invalid divider value: {}", value)))?;
                // BAUDR ignores bit 0
                if divider < 2 || divider % 2 != 0 {
                    return Err(invalid(format!(
                        "Invalid divider: {} (must be even and at least 2)",
                        divider
                    )));
                }
                opts.config = opts.config.with_divider(divider);
            }
            "mode" => {
                let mode = value
                    .parse::<u8>()
                    .ok()
                    .and_then(SpiMode::from_number)
                    .ok_or_else(|| invalid(format!("Invalid SPI mode: {} (must be 0-3)", value)))?;
                opts.config.mode = mode;
            }
            "pins" => {
                opts.select_pins = match *value {
                    "yes" | "on" | "1" => true,
                    "no" | "off" | "0" => false,
                    _ => return Err(invalid(format!("Invalid pins value: {}", value))),
                };
            }
            "timeout" => {
                let ms: u64 = value
                    .parse()
                    .map_err(|_| invalid(format!("Invalid timeout value: {}", value)))?;
                opts.timeout = (ms > 0).then(|| Duration::from_millis(ms));
            }
            _ => {
                log::warn!("rp1spi: Unknown option: {}={}", key, value);
            }
        }
    }

    if opts.select_pins && opts.instance != 0 {
        log::warn!(
            "pin routing only covers SPI0; SPI{} pins must be set up externally",
            opts.instance
        );
    }

    Ok(opts)
}

fn invalid(msg: String) -> Rp1Error {
    Rp1Error::InvalidOption(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = parse_options(&[]).unwrap();
        assert_eq!(opts, HostOptions::default());
        assert_eq!(opts.config.clock_hz(), 10_000_000);
        assert_eq!(opts.config.mode, SpiMode::Mode1);
    }

    #[test]
    fn test_parse_string() {
        let pairs = split_options("instance=1,divider=40,mode=3,pins=no,timeout=0");
        let opts = parse_options(&pairs).unwrap();
        assert_eq!(opts.instance, 1);
        assert_eq!(opts.config.clock_divider, 40);
        assert_eq!(opts.config.mode, SpiMode::Mode3);
        assert!(!opts.select_pins);
        assert_eq!(opts.timeout, None);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse_options(&[("divider", "3")]).is_err());
        assert!(parse_options(&[("divider", "0")]).is_err());
        assert!(parse_options(&[("mode", "4")]).is_err());
        assert!(parse_options(&[("pins", "maybe")]).is_err());
        assert!(matches!(
            parse_options(&[("instance", "7")]),
            Err(Rp1Error::InstanceUnavailable(7))
        ));
    }

    #[test]
    fn test_unknown_key_ignored() {
        let opts = parse_options(&[("speed", "fast")]).unwrap();
        assert_eq!(opts, HostOptions::default());
    }

    #[test]
    fn test_split_skips_malformed() {
        assert_eq!(split_options(""), Vec::<(&str, &str)>::new());
        assert_eq!(split_options("mode=0,bogus"), vec![("mode", "0")]);
    }
}
