//! Linux sysfs GPIO driver for the indicator lamps

use super::{Indicator, IndicatorOutput};
use crate::config::PinConfig;
use crate::error::{Result, SolstatError};
use crate::logging::get_logger;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lamps wired to GPIO pins, driven through `<root>/gpioN/value`
pub struct SysfsIndicators {
    root: PathBuf,
    pins: PinConfig,
    logger: crate::logging::StructuredLogger,
}

impl SysfsIndicators {
    /// Export every configured pin as an output and drive it low
    pub fn open<P: AsRef<Path>>(root: P, pins: &PinConfig) -> Result<Self> {
        let mut driver = Self {
            root: root.as_ref().to_path_buf(),
            pins: pins.clone(),
            logger: get_logger("gpio"),
        };
        for indicator in Indicator::ALL {
            driver.export(driver.pin(indicator))?;
        }
        driver.all_off()?;
        driver.logger.info(&format!(
            "GPIO outputs ready under {} (blue={}, green={}, red={}, amber={})",
            driver.root.display(),
            pins.blue,
            pins.green,
            pins.red,
            pins.amber
        ));
        Ok(driver)
    }

    fn pin(&self, indicator: Indicator) -> u32 {
        match indicator {
            Indicator::Blue => self.pins.blue,
            Indicator::Green => self.pins.green,
            Indicator::Red => self.pins.red,
            Indicator::Amber => self.pins.amber,
        }
    }

    fn pin_dir(&self, pin: u32) -> PathBuf {
        self.root.join(format!("gpio{}", pin))
    }

    fn export(&self, pin: u32) -> Result<()> {
        let dir = self.pin_dir(pin);
        if !dir.exists() {
            std::fs::write(self.root.join("export"), pin.to_string()).map_err(|e| {
                SolstatError::indicator(format!("Cannot export GPIO {}: {}", pin, e))
            })?;
            // udev needs a moment to hand the new node to our group
            for _ in 0..10 {
                if dir.join("direction").exists() {
                    break;
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        }
        std::fs::write(dir.join("direction"), "out").map_err(|e| {
            SolstatError::indicator(format!("Cannot set GPIO {} as output: {}", pin, e))
        })
    }
}

impl IndicatorOutput for SysfsIndicators {
    fn set(&mut self, indicator: Indicator, on: bool) -> Result<()> {
        let pin = self.pin(indicator);
        std::fs::write(self.pin_dir(pin).join("value"), if on { "1" } else { "0" }).map_err(
            |e| {
                SolstatError::indicator(format!(
                    "Cannot drive {} LED (GPIO {}): {}",
                    indicator.as_str(),
                    pin,
                    e
                ))
            },
        )?;
        self.logger.debug(&format!(
            "{} LED {}",
            indicator.as_str(),
            if on { "on" } else { "off" }
        ));
        Ok(())
    }
}

impl Drop for SysfsIndicators {
    fn drop(&mut self) {
        if let Err(e) = self.all_off() {
            self.logger
                .warn(&format!("Failed to clear LEDs on release: {}", e));
        }
    }
}
