//! GPIO character-device lines used for the sensor control pins.
//!
//! Lines are handed out as `embedded_hal::digital::OutputPin`s so drivers
//! never see the Linux backend directly.

#[cfg(target_os = "linux")]
use gpio_cdev::{Chip, LineRequestFlags};
#[cfg(target_os = "linux")]
use linux_embedded_hal::CdevPin;
use tracing::debug;

/// GPIO error type - platform specific
#[cfg(target_os = "linux")]
pub type GpioError = gpio_cdev::errors::Error;

#[cfg(not(target_os = "linux"))]
#[derive(Debug)]
pub struct GpioError(String);

#[cfg(not(target_os = "linux"))]
impl std::fmt::Display for GpioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GPIO not supported on this platform: {}", self.0)
    }
}

#[cfg(not(target_os = "linux"))]
impl std::error::Error for GpioError {}

/// Output line handed to sensor drivers
#[cfg(target_os = "linux")]
pub type GpioPin = CdevPin;

#[cfg(not(target_os = "linux"))]
pub struct GpioPin {
    _phantom: std::marker::PhantomData<()>,
}

#[cfg(not(target_os = "linux"))]
impl embedded_hal::digital::ErrorType for GpioPin {
    type Error = core::convert::Infallible;
}

#[cfg(not(target_os = "linux"))]
impl embedded_hal::digital::OutputPin for GpioPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A GPIO controller (`/dev/gpiochipN`)
#[cfg(target_os = "linux")]
pub struct GpioChip {
    chip: Chip,
    path: String,
}

#[cfg(not(target_os = "linux"))]
pub struct GpioChip {
    path: String,
}

#[cfg(target_os = "linux")]
impl GpioChip {
    pub fn new(path: &str) -> Result<Self, GpioError> {
        let chip = Chip::new(path)?;
        Ok(Self { chip, path: path.to_string() })
    }

    /// Claim `line` as an output driven to `initial_high` right away
    pub fn request_output(&mut self, line: u32, initial_high: bool, consumer: &str) -> Result<GpioPin, GpioError> {
        let handle = self
            .chip
            .get_line(line)?
            .request(LineRequestFlags::OUTPUT, u8::from(initial_high), consumer)?;
        debug!("[gpio] {} line {} claimed by {}", self.path, line, consumer);
        CdevPin::new(handle)
    }
}

#[cfg(not(target_os = "linux"))]
impl GpioChip {
    pub fn new(path: &str) -> Result<Self, GpioError> {
        Err(GpioError(format!("cannot open {}, GPIO is only supported on Linux", path)))
    }

    pub fn request_output(&mut self, line: u32, _initial_high: bool, consumer: &str) -> Result<GpioPin, GpioError> {
        debug!("[gpio] {} line {} requested by {}", self.path, line, consumer);
        Err(GpioError("GPIO is only supported on Linux".to_string()))
    }
}

impl GpioChip {
    pub fn path(&self) -> &str {
        &self.path
    }
}
