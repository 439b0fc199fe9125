use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use crate::errors::{ConfigError, ConfigResult};

/// Root configuration struct expecting `[[camera]]` TOML array format
#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    #[serde(rename = "camera")]
    pub cameras: Vec<CameraEntry>,
}

/// One camera sensor, matching each `[[camera]]` section
#[derive(Debug, Clone, Deserialize)]
pub struct CameraEntry {
    pub id: String,
    pub driver: String,
    /// I2C bus id from buses.toml
    pub bus: String,
    /// 7-bit I2C slave address
    pub address: u8,
    /// GPIO chip id from buses.toml
    pub gpio: String,
    pub pwdn_line: u32,
    pub reset_line: u32,
    /// Requested master clock in Hz
    pub mclk: u32,
    pub mclk_source: u8,
    pub csi_id: u32,
    /// Initial frame rate, 15 or 30
    pub frame_rate: Option<u32>,
    /// Register table profile name
    pub tuning: Option<String>,
    /// Refuse to start when the chip ID register does not match
    pub strict_chip_id: Option<bool>,
}

impl CameraConfig {
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let parsed: CameraConfig = toml::from_str(content)?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> ConfigResult<()> {
        let mut ids = HashSet::new();
        for cam in &self.cameras {
            if !ids.insert(cam.id.as_str()) {
                return Err(ConfigError::ValidationError(format!("duplicate camera id '{}'", cam.id)));
            }
            if cam.address > 0x7f {
                return Err(invalid(cam, "address", format!("{:#04x} is not a 7-bit address", cam.address)));
            }
            if cam.pwdn_line == cam.reset_line {
                return Err(invalid(cam, "reset_line", format!("line {} is already the power-down line", cam.reset_line)));
            }
            if let Some(fps) = cam.frame_rate {
                if fps != 15 && fps != 30 {
                    return Err(invalid(cam, "frame_rate", format!("{} fps is not one of 15, 30", fps)));
                }
            }
        }
        Ok(())
    }
}

fn invalid(cam: &CameraEntry, field: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { field: format!("{}.{}", cam.id, field), reason }
}

/// Loads config from TOML file
pub fn load_camera_config(path: &str) -> ConfigResult<CameraConfig> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadError {
        path: path.to_string(),
        source: e,
    })?;
    CameraConfig::from_toml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(extra: &str) -> String {
        format!(
            r#"
            [[camera]]
            id = "cam0"
            driver = "gc0308"
            bus = "i2c1"
            address = 0x21
            gpio = "gpio0"
            pwdn_line = 6
            reset_line = 7
            mclk = 24000000
            mclk_source = 0
            csi_id = 1
            {extra}
            "#
        )
    }

    #[test]
    fn parses_minimal_entry() {
        let cfg = CameraConfig::from_toml(&entry("")).unwrap();
        let cam = &cfg.cameras[0];
        assert_eq!(cam.address, 0x21);
        assert_eq!(cam.csi_id, 1);
        assert_eq!(cam.frame_rate, None);
        assert_eq!(cam.tuning, None);
        assert_eq!(cam.strict_chip_id, None);
    }

    #[test]
    fn parses_optional_fields() {
        let cfg = CameraConfig::from_toml(&entry(
            "frame_rate = 15\ntuning = \"vga_30fps\"\nstrict_chip_id = false",
        ))
        .unwrap();
        let cam = &cfg.cameras[0];
        assert_eq!(cam.frame_rate, Some(15));
        assert_eq!(cam.tuning.as_deref(), Some("vga_30fps"));
        assert_eq!(cam.strict_chip_id, Some(false));
    }

    #[test]
    fn rejects_unsupported_frame_rate() {
        let err = CameraConfig::from_toml(&entry("frame_rate = 25")).unwrap_err();
        assert!(err.to_string().contains("cam0.frame_rate"));
    }

    #[test]
    fn rejects_shared_control_line() {
        let toml = entry("").replace("reset_line = 7", "reset_line = 6");
        let err = CameraConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("cam0.reset_line"));
    }

    #[test]
    fn rejects_address_above_seven_bits() {
        let toml = entry("").replace("address = 0x21", "address = 0x42");
        assert!(CameraConfig::from_toml(&toml).is_ok());

        let toml = entry("").replace("address = 0x21", "address = 0x84");
        assert!(CameraConfig::from_toml(&toml).is_err());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let twice = format!("{}{}", entry(""), entry(""));
        let err = CameraConfig::from_toml(&twice).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
