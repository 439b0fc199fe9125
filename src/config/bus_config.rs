use serde::Deserialize;
use std::fs;
use crate::bus::BusKind;
use crate::errors::{ConfigError, ConfigResult};

/// Root structure for loading `[[bus]]` style TOML config
#[derive(Debug, Deserialize)]
pub struct BusConfig {
    #[serde(rename = "bus")]
    pub buses: Vec<BusEntry>,
}

/// One bus entry (an I2C adapter or a GPIO chip)
#[derive(Debug, Deserialize)]
pub struct BusEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BusKind,
    pub path: String,
}

impl BusConfig {
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn find(&self, id: &str) -> Option<&BusEntry> {
        self.buses.iter().find(|b| b.id == id)
    }
}

/// Load bus config file
pub fn load_bus_config(path: &str) -> ConfigResult<BusConfig> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadError {
        path: path.to_string(),
        source: e,
    })?;
    BusConfig::from_toml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bus_kinds() {
        let cfg = BusConfig::from_toml(
            r#"
            [[bus]]
            id = "i2c1"
            type = "i2c"
            path = "/dev/i2c-1"

            [[bus]]
            id = "gpio0"
            type = "gpio"
            path = "/dev/gpiochip0"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.buses.len(), 2);
        assert_eq!(cfg.find("i2c1").unwrap().kind, BusKind::I2c);
        assert_eq!(cfg.find("gpio0").unwrap().path, "/dev/gpiochip0");
        assert!(cfg.find("spi0").is_none());
    }

    #[test]
    fn rejects_unknown_bus_type() {
        let err = BusConfig::from_toml(
            r#"
            [[bus]]
            id = "uart0"
            type = "serial"
            path = "/dev/ttyS0"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::FormatError(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_bus_config("/nonexistent/buses.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/buses.toml"));
    }
}
