pub mod bus_config;
pub mod camera_config;

pub use bus_config::{load_bus_config, BusConfig, BusEntry};
pub use camera_config::{load_camera_config, CameraConfig, CameraEntry};

use crate::bus::BusKind;
use crate::errors::{ConfigError, ConfigResult};
use std::collections::HashSet;

/// Cross-check camera entries against the configured buses
pub fn validate(buses: &BusConfig, cameras: &CameraConfig) -> ConfigResult<()> {
    let mut bus_ids = HashSet::new();
    for b in &buses.buses {
        if !bus_ids.insert(b.id.as_str()) {
            return Err(ConfigError::ValidationError(format!("duplicate bus id '{}'", b.id)));
        }
    }

    for cam in &cameras.cameras {
        require_bus(buses, &cam.id, "bus", &cam.bus, BusKind::I2c)?;
        require_bus(buses, &cam.id, "gpio", &cam.gpio, BusKind::Gpio)?;
    }

    Ok(())
}

fn require_bus(buses: &BusConfig, camera: &str, field: &str, id: &str, kind: BusKind) -> ConfigResult<()> {
    match buses.find(id) {
        Some(b) if b.kind == kind => Ok(()),
        Some(b) => Err(ConfigError::InvalidValue {
            field: format!("{}.{}", camera, field),
            reason: format!("bus '{}' is {:?}, expected {:?}", id, b.kind, kind),
        }),
        None => Err(ConfigError::InvalidValue {
            field: format!("{}.{}", camera, field),
            reason: format!("no bus with id '{}'", id),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUSES: &str = r#"
        [[bus]]
        id = "i2c1"
        type = "i2c"
        path = "/dev/i2c-1"

        [[bus]]
        id = "gpio0"
        type = "gpio"
        path = "/dev/gpiochip0"
    "#;

    fn camera(bus: &str, gpio: &str) -> CameraConfig {
        CameraConfig::from_toml(&format!(
            r#"
            [[camera]]
            id = "cam0"
            driver = "gc0308"
            bus = "{bus}"
            address = 0x21
            gpio = "{gpio}"
            pwdn_line = 6
            reset_line = 7
            mclk = 24000000
            mclk_source = 0
            csi_id = 0
            "#
        ))
        .unwrap()
    }

    #[test]
    fn accepts_matching_bus_references() {
        let buses = BusConfig::from_toml(BUSES).unwrap();
        assert!(validate(&buses, &camera("i2c1", "gpio0")).is_ok());
    }

    #[test]
    fn rejects_unknown_bus() {
        let buses = BusConfig::from_toml(BUSES).unwrap();
        let err = validate(&buses, &camera("i2c7", "gpio0")).unwrap_err();
        assert!(err.to_string().contains("cam0.bus"));
    }

    #[test]
    fn rejects_bus_of_wrong_kind() {
        let buses = BusConfig::from_toml(BUSES).unwrap();
        let err = validate(&buses, &camera("i2c1", "i2c1")).unwrap_err();
        assert!(err.to_string().contains("expected Gpio"));
    }

    #[test]
    fn rejects_duplicate_bus_ids() {
        let doubled = format!("{BUSES}\n[[bus]]\nid = \"i2c1\"\ntype = \"i2c\"\npath = \"/dev/i2c-2\"\n");
        let buses = BusConfig::from_toml(&doubled).unwrap();
        assert!(validate(&buses, &camera("i2c1", "gpio0")).is_err());
    }
}
