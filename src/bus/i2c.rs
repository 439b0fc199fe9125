#[cfg(target_os = "linux")]
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
#[cfg(target_os = "linux")]
use i2cdev::core::I2CDevice;

use async_trait::async_trait;
#[cfg(target_os = "linux")]
use tracing::trace;
use super::RegisterBus;
use crate::errors::BusResult;

/// I2C bus error type - platform specific
#[cfg(target_os = "linux")]
pub type I2CError = LinuxI2CError;

#[cfg(not(target_os = "linux"))]
#[derive(Debug)]
pub struct I2CError(String);

#[cfg(not(target_os = "linux"))]
impl std::fmt::Display for I2CError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "I2C not supported on this platform: {}", self.0)
    }
}

#[cfg(not(target_os = "linux"))]
impl std::error::Error for I2CError {}

/// I2C bus backed by an i2c-dev character device
#[cfg(target_os = "linux")]
pub struct I2CBus {
    device: LinuxI2CDevice,
    path: String,
}

#[cfg(not(target_os = "linux"))]
pub struct I2CBus {
    path: String,
}

#[cfg(target_os = "linux")]
impl I2CBus {
    pub fn new(path: &str) -> Result<Self, I2CError> {
        let device = LinuxI2CDevice::new(path, 0)?;
        Ok(Self { device, path: path.to_string() })
    }
}

#[cfg(not(target_os = "linux"))]
impl I2CBus {
    pub fn new(path: &str) -> Result<Self, I2CError> {
        Err(I2CError(format!("cannot open {}, I2C is only supported on Linux", path)))
    }
}

impl I2CBus {
    pub fn path(&self) -> &str {
        &self.path
    }
}

// Plain transfers rather than SMBus commands: the sensor expects a stop
// between the register pointer write and the data read.
#[cfg(target_os = "linux")]
#[async_trait]
impl RegisterBus for I2CBus {
    async fn write_reg(&mut self, address: u8, reg: u8, value: u8) -> BusResult<()> {
        trace!("[i2c] {} {:#04x}: write {:#04x} = {:#04x}", self.path, address, reg, value);
        self.device.set_slave_address(address as u16)?;
        self.device.write(&[reg, value])?;
        Ok(())
    }

    async fn read_reg(&mut self, address: u8, reg: u8) -> BusResult<u8> {
        self.device.set_slave_address(address as u16)?;
        self.device.write(&[reg])?;
        let mut buf = [0u8; 1];
        self.device.read(&mut buf)?;
        trace!("[i2c] {} {:#04x}: read {:#04x} = {:#04x}", self.path, address, reg, buf[0]);
        Ok(buf[0])
    }
}

#[cfg(not(target_os = "linux"))]
#[async_trait]
impl RegisterBus for I2CBus {
    async fn write_reg(&mut self, _address: u8, _reg: u8, _value: u8) -> BusResult<()> {
        Err(I2CError("I2C is only supported on Linux".to_string()).into())
    }

    async fn read_reg(&mut self, _address: u8, _reg: u8) -> BusResult<u8> {
        Err(I2CError("I2C is only supported on Linux".to_string()).into())
    }
}
