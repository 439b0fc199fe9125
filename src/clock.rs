use tracing::debug;
use crate::errors::ClockError;

/// Lowest master clock the sensor accepts, in Hz
pub const MCLK_MIN_HZ: u32 = 6_000_000;
/// Highest master clock the sensor accepts, in Hz
pub const MCLK_MAX_HZ: u32 = 24_000_000;

/// Clamp a requested master clock into the sensor's accepted range
pub fn clamp_mclk(hz: u32) -> u32 {
    hz.clamp(MCLK_MIN_HZ, MCLK_MAX_HZ)
}

/// Clock feeding the sensor's MCLK input
pub trait MasterClock: Send + Sync {
    fn set_rate(&mut self, hz: u32) -> Result<(), ClockError>;
    fn rate(&self) -> u32;
    fn enable(&mut self);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;
}

/// Board oscillator wired straight to MCLK. The rate cannot change and
/// gating is only tracked, since nothing in userspace can switch it.
#[derive(Debug, Clone)]
pub struct FixedClock {
    name: String,
    rate_hz: u32,
    enabled: bool,
}

impl FixedClock {
    pub fn new(name: impl Into<String>, rate_hz: u32) -> Self {
        Self { name: name.into(), rate_hz, enabled: false }
    }
}

impl MasterClock for FixedClock {
    fn set_rate(&mut self, hz: u32) -> Result<(), ClockError> {
        if hz != self.rate_hz {
            return Err(ClockError::FixedRate {
                clock: self.name.clone(),
                requested_hz: hz,
                fixed_hz: self.rate_hz,
            });
        }
        Ok(())
    }

    fn rate(&self) -> u32 {
        self.rate_hz
    }

    fn enable(&mut self) {
        debug!("[clock] {} enabled at {} Hz", self.name, self.rate_hz);
        self.enabled = true;
    }

    fn disable(&mut self) {
        debug!("[clock] {} disabled", self.name);
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
