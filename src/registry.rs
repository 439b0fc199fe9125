use crate::bus::gpio::{GpioChip, GpioPin};
use crate::bus::i2c::I2CBus;
use crate::bus::{BusKind, RegisterBus};
use crate::clock::FixedClock;
use crate::config::{self, BusConfig, CameraConfig, CameraEntry};
use crate::errors::{RegistryError, RegistryResult, SensorError, SensorResult};
use crate::grpc_service::SubdevService;
use crate::sensors::{create_subdev_driver, SubdevDriver};
use embedded_hal::digital::OutputPin;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Source of the register buses and control lines cameras are wired to
pub trait CameraHardware {
    type Bus: RegisterBus + 'static;
    type Pin: OutputPin + Send + Sync + 'static;

    fn register_bus(&self, id: &str) -> Option<Arc<Mutex<Self::Bus>>>;

    /// Claim `line` on the GPIO chip `gpio` as an output
    fn request_output(&mut self, gpio: &str, line: u32, initial_high: bool, consumer: &str) -> SensorResult<Self::Pin>;
}

/// Opened bus handles, keyed by bus id
pub struct Buses {
    pub i2c: HashMap<String, Arc<Mutex<I2CBus>>>,
    pub gpio: HashMap<String, GpioChip>,
}

impl Buses {
    pub fn open(bus_cfg: &BusConfig) -> RegistryResult<Self> {
        let mut i2c = HashMap::new();
        let mut gpio = HashMap::new();

        for b in bus_cfg.buses.iter() {
            match b.kind {
                BusKind::I2c => {
                    let bus = I2CBus::new(&b.path).map_err(|e| {
                        RegistryError::DriverCreationError(SensorError::BusOpen { bus: b.id.clone(), source: e.into() })
                    })?;
                    info!("[registry] opened i2c bus {} at {}", b.id, bus.path());
                    i2c.insert(b.id.clone(), Arc::new(Mutex::new(bus)));
                }
                BusKind::Gpio => {
                    let chip = GpioChip::new(&b.path).map_err(|e| RegistryError::DriverCreationError(e.into()))?;
                    info!("[registry] opened gpio chip {} at {}", b.id, chip.path());
                    gpio.insert(b.id.clone(), chip);
                }
            }
        }

        Ok(Self { i2c, gpio })
    }
}

impl CameraHardware for Buses {
    type Bus = I2CBus;
    type Pin = GpioPin;

    fn register_bus(&self, id: &str) -> Option<Arc<Mutex<I2CBus>>> {
        self.i2c.get(id).cloned()
    }

    fn request_output(&mut self, gpio: &str, line: u32, initial_high: bool, consumer: &str) -> SensorResult<GpioPin> {
        let chip = self
            .gpio
            .get_mut(gpio)
            .ok_or_else(|| SensorError::BusNotFound { bus: gpio.to_string() })?;
        let pin = chip.request_output(line, initial_high, consumer)?;
        info!("[registry] {} line {} claimed as {}", chip.path(), line, consumer);
        Ok(pin)
    }
}

/// Claim the camera's control lines and clock and build its driver
fn build_driver<H: CameraHardware>(cam: &CameraEntry, hw: &mut H) -> SensorResult<Box<dyn SubdevDriver>> {
    // both lines start high: sensor in power-down, reset released
    let pwdn = hw.request_output(&cam.gpio, cam.pwdn_line, true, &format!("{}_pwdn", cam.driver))?;
    let reset = hw.request_output(&cam.gpio, cam.reset_line, true, &format!("{}_reset", cam.driver))?;
    let clock = FixedClock::new(format!("{}_mclk", cam.id), cam.mclk);

    create_subdev_driver(cam, pwdn, reset, Box::new(clock))
}

async fn bring_up<H: CameraHardware>(cam: &CameraEntry, hw: &mut H, service: &SubdevService) -> RegistryResult<()> {
    let mut driver = build_driver(cam, hw).map_err(RegistryError::DriverCreationError)?;
    info!("[registry] registering camera: id={} driver={} bus={}", cam.id, cam.driver, cam.bus);

    let bus_arc = hw
        .register_bus(&cam.bus)
        .ok_or_else(|| RegistryError::DriverCreationError(SensorError::BusNotFound { bus: cam.bus.clone() }))?;
    {
        let mut bus = bus_arc.lock().await;
        driver.probe(&mut *bus).await.map_err(RegistryError::ProbeError)?;
    }

    service.register(driver).await?;
    Ok(())
}

/// Probe every camera on `hw` and register it with the control service.
/// On the first failure the cameras registered so far are unregistered,
/// which powers them down, and the error is returned.
pub async fn register_cameras<H: CameraHardware>(
    hw: &mut H,
    camera_cfg: &CameraConfig,
    service: &SubdevService,
) -> RegistryResult<Vec<String>> {
    let mut registered: Vec<String> = Vec::new();
    info!("[registry] initializing {} camera(s)...", camera_cfg.cameras.len());

    for cam in camera_cfg.cameras.iter() {
        if let Err(e) = bring_up(cam, hw, service).await {
            warn!("[registry] {} failed, releasing {} camera(s)", cam.id, registered.len());
            for id in registered.iter() {
                if let Err(e) = service.unregister(id).await {
                    warn!("[registry] {}", e);
                }
            }
            return Err(e);
        }
        registered.push(cam.id.clone());
    }

    Ok(registered)
}

/// Open every bus, probe every configured camera and register it with the
/// control service. Returns the ids of the registered subdevices.
pub async fn init_all(
    bus_cfg: &BusConfig,
    camera_cfg: &CameraConfig,
    service: &SubdevService,
) -> RegistryResult<Vec<String>> {
    config::validate(bus_cfg, camera_cfg)?;
    let mut buses = Buses::open(bus_cfg)?;
    register_cameras(&mut buses, camera_cfg, service).await
}


#[cfg(all(test, feature = "gc0308"))]
mod bring_up_tests {
    use super::*;
    use crate::bus::gpio::mock::{EdgeLog, MockPin};
    use crate::bus::mock::MockBus;
    use crate::sensors::gc0308::{regs, CHIP_ID};

    const REG_CHIP_ID: u8 = 0x00;

    /// Requested lines and register buses held in memory
    #[derive(Default)]
    struct FakeHardware {
        buses: HashMap<String, Arc<Mutex<MockBus>>>,
        lines: HashMap<u32, EdgeLog>,
        claims: Vec<(String, u32, bool, String)>,
    }

    impl FakeHardware {
        fn with_bus(mut self, id: &str, bus: MockBus) -> Self {
            self.buses.insert(id.to_string(), Arc::new(Mutex::new(bus)));
            self
        }

        fn last_level(&self, line: u32) -> Option<bool> {
            self.lines[&line].lock().unwrap().last().map(|e| e.high)
        }
    }

    impl CameraHardware for FakeHardware {
        type Bus = MockBus;
        type Pin = MockPin;

        fn register_bus(&self, id: &str) -> Option<Arc<Mutex<MockBus>>> {
            self.buses.get(id).cloned()
        }

        fn request_output(&mut self, gpio: &str, line: u32, initial_high: bool, consumer: &str) -> SensorResult<MockPin> {
            if gpio != "gpio0" {
                return Err(SensorError::BusNotFound { bus: gpio.to_string() });
            }
            self.claims.push((gpio.to_string(), line, initial_high, consumer.to_string()));
            let log = self.lines.entry(line).or_default().clone();
            Ok(MockPin::new("line", &log))
        }
    }

    fn gc0308_bus() -> MockBus {
        MockBus::default().with_reg(REG_CHIP_ID, CHIP_ID)
    }

    fn camera(id: &str, driver: &str, bus: &str, pwdn_line: u32) -> String {
        format!(
            r#"
            [[camera]]
            id = "{id}"
            driver = "{driver}"
            bus = "{bus}"
            address = 0x21
            gpio = "gpio0"
            pwdn_line = {pwdn_line}
            reset_line = {reset_line}
            mclk = 24000000
            mclk_source = 0
            csi_id = 0
            "#,
            reset_line = pwdn_line + 1,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn registers_camera_after_successful_bring_up() {
        let mut hw = FakeHardware::default().with_bus("i2c1", gc0308_bus());
        let cameras = CameraConfig::from_toml(&camera("cam0", "gc0308", "i2c1", 6)).unwrap();
        let service = SubdevService::new();

        let registered = register_cameras(&mut hw, &cameras, &service).await.unwrap();

        assert_eq!(registered, vec!["cam0".to_string()]);
        assert_eq!(service.ids().await, vec!["cam0".to_string()]);
        assert_eq!(
            hw.claims,
            vec![
                ("gpio0".to_string(), 6, true, "gc0308_pwdn".to_string()),
                ("gpio0".to_string(), 7, true, "gc0308_reset".to_string()),
            ]
        );

        let bus = hw.buses["i2c1"].lock().await;
        assert_eq!(bus.writes.len(), regs::DEFAULT_SETTING.len());
        drop(bus);
        // power-down released at the end of bring-up
        assert_eq!(hw.last_level(6), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_camera_releases_the_ones_before_it() {
        let mut dead = MockBus::default();
        dead.fail_reads = true;
        let mut hw = FakeHardware::default()
            .with_bus("i2c1", gc0308_bus())
            .with_bus("i2c2", dead);
        let toml = format!("{}{}", camera("cam0", "gc0308", "i2c1", 6), camera("cam1", "gc0308", "i2c2", 8));
        let cameras = CameraConfig::from_toml(&toml).unwrap();
        let service = SubdevService::new();

        let err = register_cameras(&mut hw, &cameras, &service).await.unwrap_err();

        assert!(matches!(err, RegistryError::ProbeError(SensorError::RegisterAccess { .. })));
        assert!(service.ids().await.is_empty());
        // both sensors are back in power-down
        assert_eq!(hw.last_level(6), Some(true));
        assert_eq!(hw.last_level(8), Some(true));
    }

    #[tokio::test]
    async fn unknown_driver_is_rejected() {
        let mut hw = FakeHardware::default().with_bus("i2c1", gc0308_bus());
        let cameras = CameraConfig::from_toml(&camera("cam0", "ov5640", "i2c1", 6)).unwrap();
        let service = SubdevService::new();

        let err = register_cameras(&mut hw, &cameras, &service).await.unwrap_err();

        assert!(matches!(
            err,
            RegistryError::DriverCreationError(SensorError::UnsupportedDriver { ref driver }) if driver == "ov5640"
        ));
        assert!(hw.buses["i2c1"].lock().await.writes.is_empty());
    }
}
