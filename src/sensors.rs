use async_trait::async_trait;
use embedded_hal::digital::OutputPin;
use crate::bus::RegisterBus;
use crate::clock::MasterClock;
use crate::config::CameraEntry;
use crate::errors::{SensorError, SensorResult};
use crate::v4l2::{BufType, Fract, FrameIntervalQuery, FrameSize, MbusFrameFmt, StreamParm};

#[cfg(feature = "gc0308")]
pub mod gc0308;

/// Snapshot of a subdevice for status reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdevStatus {
    pub id: String,
    pub driver: &'static str,
    pub bus: String,
    pub address: u8,
    pub powered: bool,
    pub chip_id: Option<u8>,
    pub output_format_reg: Option<u8>,
    pub mclk_hz: u32,
    pub mclk_source: u8,
    pub csi_id: u32,
    pub frame_rate: u32,
    pub tuning: &'static str,
}

/// A camera subdevice: core power control plus the video operations a
/// capture pipeline calls to negotiate formats and frame rates
#[async_trait]
pub trait SubdevDriver: Send + Sync {
    /// Power-cycle the sensor, identify it and push its register table
    async fn probe(&mut self, bus: &mut dyn RegisterBus) -> SensorResult<()>;
    /// Gate the clock and hold the sensor in power-down
    async fn remove(&mut self) -> SensorResult<()>;

    fn s_power(&mut self, on: bool) -> SensorResult<()>;
    fn g_parm(&self, buf_type: BufType) -> SensorResult<StreamParm>;
    fn s_parm(&mut self, parm: StreamParm) -> SensorResult<StreamParm>;
    fn try_fmt(&self, fmt: MbusFrameFmt) -> MbusFrameFmt;
    fn s_fmt(&mut self, fmt: MbusFrameFmt) -> SensorResult<MbusFrameFmt>;
    fn g_fmt(&self) -> MbusFrameFmt;
    fn enum_fmt(&self, index: u32) -> SensorResult<u32>;
    fn enum_framesizes(&self, index: u32) -> SensorResult<FrameSize>;
    fn enum_frameintervals(&self, query: &FrameIntervalQuery) -> SensorResult<Fract>;

    fn id(&self) -> &str;
    fn bus(&self) -> &str;
    fn driver(&self) -> &'static str;
    fn is_powered(&self) -> bool;
    fn status(&self) -> SubdevStatus;
}

/// Build the driver named by a camera entry around its claimed control
/// lines and master clock
pub fn create_subdev_driver<P>(
    entry: &CameraEntry,
    pwdn: P,
    reset: P,
    clock: Box<dyn MasterClock>,
) -> SensorResult<Box<dyn SubdevDriver>>
where
    P: OutputPin + Send + Sync + 'static,
{
    match entry.driver.as_str() {
        #[cfg(feature = "gc0308")]
        "gc0308" => Ok(Box::new(gc0308::Gc0308::new(entry, pwdn, reset, clock)?)),
        _ => Err(SensorError::UnsupportedDriver { driver: entry.driver.clone() }),
    }
}
