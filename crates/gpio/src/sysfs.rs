//! Linux sysfs GPIO driver

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{GpioError, PinWriter};

/// Default sysfs GPIO class directory
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// Output lines acquired through `/sys/class/gpio`.
///
/// Every line is exported and configured as a low output on open. Dropping
/// the driver drives every line low and unexports it again.
pub struct SysfsGpio {
    root: PathBuf,
    pins: Vec<u8>,
}

impl SysfsGpio {
    /// Acquire `pins` as outputs, initially low
    pub fn open(root: &Path, pins: &[u8]) -> Result<Self, GpioError> {
        let mut gpio = Self {
            root: root.to_path_buf(),
            pins: Vec::with_capacity(pins.len()),
        };

        // Lines acquired so far are released by Drop if a later one fails
        for &pin in pins {
            gpio.export(pin)?;
            gpio.pins.push(pin);
        }

        info!("Acquired GPIO lines {:?}", gpio.pins);
        Ok(gpio)
    }

    fn line_dir(&self, pin: u8) -> PathBuf {
        self.root.join(format!("gpio{}", pin))
    }

    fn export(&self, pin: u8) -> Result<(), GpioError> {
        let unavailable = |e: std::io::Error| GpioError::Unavailable {
            pin,
            reason: e.to_string(),
        };

        if !self.line_dir(pin).exists() {
            fs::write(self.root.join("export"), pin.to_string()).map_err(unavailable)?;
        }
        fs::write(self.line_dir(pin).join("direction"), "out").map_err(unavailable)?;
        fs::write(self.line_dir(pin).join("value"), "0").map_err(unavailable)?;
        debug!("Exported GPIO {}", pin);
        Ok(())
    }

    pub fn pins(&self) -> &[u8] {
        &self.pins
    }
}

impl PinWriter for SysfsGpio {
    fn write(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        if !self.pins.contains(&pin) {
            return Err(GpioError::NotAcquired(pin));
        }
        fs::write(self.line_dir(pin).join("value"), if high { "1" } else { "0" }).map_err(|e| {
            GpioError::Write {
                pin,
                reason: e.to_string(),
            }
        })
    }
}

impl Drop for SysfsGpio {
    fn drop(&mut self) {
        for &pin in &self.pins {
            if let Err(e) = fs::write(self.line_dir(pin).join("value"), "0") {
                warn!("Failed to drive GPIO {} low on release: {}", pin, e);
            }
            if let Err(e) = fs::write(self.root.join("unexport"), pin.to_string()) {
                warn!("Failed to unexport GPIO {}: {}", pin, e);
            }
        }
        if !self.pins.is_empty() {
            info!("Released GPIO lines {:?}", self.pins);
        }
    }
}
