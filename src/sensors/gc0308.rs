//! GalaxyCore GC0308 VGA CMOS sensor.
//!
//! The sensor is configured entirely by replaying a vendor register table
//! after a GPIO power cycle; exposure and white balance then run inside the
//! sensor. What remains here is the power sequence, the table download and
//! the format/frame-rate callbacks of a single 640x480 YUYV mode.

pub mod regs;

use async_trait::async_trait;
use embedded_hal::digital::{OutputPin, PinState};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use self::regs::{RegValue, Tuning, MODE_INFO};
use super::{SubdevDriver, SubdevStatus};
use crate::bus::RegisterBus;
use crate::clock::{clamp_mclk, MasterClock};
use crate::config::CameraEntry;
use crate::errors::{SensorError, SensorResult};
use crate::v4l2::{
    BufType, CaptureParm, Colorspace, DataFormat, Field, Fract, FrameIntervalQuery, FrameSize,
    MbusFrameFmt, PixFormat, StreamParm, MEDIA_BUS_FMT_YUYV8_2X8, V4L2_CAP_TIMEPERFRAME,
    V4L2_MODE_HIGHQUALITY, V4L2_PIX_FMT_YUYV,
};

pub const DRIVER_NAME: &str = "gc0308";

// Register addresses
const REG_CHIP_ID: u8 = 0x00;
const REG_OUTPUT_FORMAT: u8 = 0x24;

// Expected CHIP_ID value
pub const CHIP_ID: u8 = 0x9b;

pub const MIN_FPS: u32 = 15;
pub const MAX_FPS: u32 = 30;
pub const DEFAULT_FPS: u32 = 30;

/// Number of sensor modes (only VGA)
pub const MODE_COUNT: usize = 1;

// Power sequence timings
const POWER_EDGE_DELAY: Duration = Duration::from_millis(5);
const RESET_PULSE: Duration = Duration::from_millis(1);
const POWER_DOWN_SETTLE: Duration = Duration::from_millis(2);
// The first 9 frames after a table download are garbage
const INIT_SETTLE: Duration = Duration::from_millis(300);

static COLOUR_FMTS: [DataFormat; 1] = [DataFormat {
    code: MEDIA_BUS_FMT_YUYV8_2X8,
    colorspace: Colorspace::Jpeg,
}];

fn find_datafmt(code: u32) -> Option<&'static DataFormat> {
    COLOUR_FMTS.iter().find(|f| f.code == code)
}

/// Frame rates the register tables are tuned for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRate {
    Fps15,
    Fps30,
}

impl FrameRate {
    pub const ALL: [FrameRate; 2] = [FrameRate::Fps15, FrameRate::Fps30];

    pub fn from_fps(fps: u32) -> Option<Self> {
        match fps {
            15 => Some(FrameRate::Fps15),
            30 => Some(FrameRate::Fps30),
            _ => None,
        }
    }

    pub fn fps(self) -> u32 {
        match self {
            FrameRate::Fps15 => 15,
            FrameRate::Fps30 => 30,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy)]
enum Pin {
    PowerDown,
    Reset,
}

impl Pin {
    fn name(self) -> &'static str {
        match self {
            Pin::PowerDown => "power-down",
            Pin::Reset => "reset",
        }
    }
}

pub struct Gc0308<P> {
    id: String,
    address: u8,
    bus_id: String,
    pwdn: P,
    reset: P,
    clock: Box<dyn MasterClock>,
    mclk: u32,
    mclk_source: u8,
    csi: u32,
    tuning: Tuning,
    strict_chip_id: bool,

    pix: PixFormat,
    fmt: &'static DataFormat,
    streamcap: CaptureParm,
    frame_rate: FrameRate,
    on: bool,

    chip_id: Option<u8>,
    output_format_reg: Option<u8>,
}

impl<P> Gc0308<P>
where
    P: OutputPin + Send + Sync,
{
    pub fn new(entry: &CameraEntry, pwdn: P, reset: P, clock: Box<dyn MasterClock>) -> SensorResult<Self> {
        let tuning = match entry.tuning.as_deref() {
            None => Tuning::default(),
            Some(name) => Tuning::from_name(name).ok_or_else(|| SensorError::ConfigError {
                sensor: entry.id.clone(),
                reason: format!("unknown tuning profile '{}'", name),
            })?,
        };

        let fps = entry.frame_rate.unwrap_or(DEFAULT_FPS);
        let frame_rate = FrameRate::from_fps(fps).ok_or_else(|| SensorError::ConfigError {
            sensor: entry.id.clone(),
            reason: format!("{} fps is not supported", fps),
        })?;

        Ok(Self {
            id: entry.id.clone(),
            address: entry.address,
            bus_id: entry.bus.clone(),
            pwdn,
            reset,
            clock,
            mclk: entry.mclk,
            mclk_source: entry.mclk_source,
            csi: entry.csi_id,
            tuning,
            strict_chip_id: entry.strict_chip_id.unwrap_or(true),
            pix: PixFormat {
                width: 640,
                height: 480,
                pixelformat: V4L2_PIX_FMT_YUYV,
            },
            fmt: &COLOUR_FMTS[0],
            streamcap: CaptureParm {
                capability: V4L2_MODE_HIGHQUALITY | V4L2_CAP_TIMEPERFRAME,
                capture_mode: 0,
                time_per_frame: Fract::per_second(fps),
            },
            frame_rate,
            on: false,
            chip_id: None,
            output_format_reg: None,
        })
    }

    fn set_pin(&mut self, pin: Pin, high: bool) -> SensorResult<()> {
        let line = match pin {
            Pin::PowerDown => &mut self.pwdn,
            Pin::Reset => &mut self.reset,
        };
        line.set_state(PinState::from(high)).map_err(|e| SensorError::PinError {
            sensor: self.id.clone(),
            pin: pin.name(),
            reason: format!("{:?}", e),
        })
    }

    /// Hardware reset: pulse reset low while power-down is released,
    /// leaving the sensor reset-deasserted and powered down
    async fn reset(&mut self) -> SensorResult<()> {
        self.set_pin(Pin::Reset, true)?;

        self.set_pin(Pin::PowerDown, true)?;
        sleep(POWER_EDGE_DELAY).await;
        self.set_pin(Pin::PowerDown, false)?;
        sleep(POWER_EDGE_DELAY).await;

        self.set_pin(Pin::Reset, false)?;
        sleep(RESET_PULSE).await;
        self.set_pin(Pin::Reset, true)?;
        sleep(POWER_EDGE_DELAY).await;

        self.set_pin(Pin::PowerDown, true)
    }

    async fn power_down(&mut self, enable: bool) -> SensorResult<()> {
        self.set_pin(Pin::PowerDown, enable)?;
        sleep(POWER_DOWN_SETTLE).await;
        Ok(())
    }

    async fn read_reg(&self, bus: &mut dyn RegisterBus, reg: u8) -> SensorResult<u8> {
        bus.read_reg(self.address, reg)
            .await
            .map_err(|e| SensorError::RegisterAccess {
                sensor: self.id.clone(),
                reg,
                source: e,
            })
    }

    /// Write a register table in order, stopping at the first failure
    async fn download_firmware(&self, bus: &mut dyn RegisterBus, table: &[RegValue]) -> SensorResult<()> {
        debug!("[{}] downloading {} register writes", self.id, table.len());
        for (index, rv) in table.iter().enumerate() {
            bus.write_reg(self.address, rv.addr, rv.val)
                .await
                .map_err(|e| SensorError::TableDownload {
                    sensor: self.id.clone(),
                    index,
                    reg: rv.addr,
                    source: e,
                })?;
        }
        Ok(())
    }

    async fn init_mode(&mut self, bus: &mut dyn RegisterBus) -> SensorResult<()> {
        self.download_firmware(bus, self.tuning.table()).await?;

        sleep(INIT_SETTLE).await;

        let mode = MODE_INFO[self.frame_rate.index()][0];
        self.pix.width = mode.width;
        self.pix.height = mode.height;
        Ok(())
    }

    async fn init_device(&mut self, bus: &mut dyn RegisterBus) -> SensorResult<()> {
        self.on = true;

        let fps = self.streamcap.time_per_frame.fps().unwrap_or(0);
        if FrameRate::from_fps(fps).is_none() {
            return Err(SensorError::UnsupportedFrameRate { sensor: self.id.clone(), fps });
        }

        self.init_mode(bus).await
    }

    async fn bring_up(&mut self, bus: &mut dyn RegisterBus) -> SensorResult<()> {
        self.reset().await?;
        self.power_down(false).await?;

        let chip_id = self.read_reg(bus, REG_CHIP_ID).await?;
        info!("[{}] chip ID is {:#04x}", self.id, chip_id);
        self.chip_id = Some(chip_id);
        if chip_id != CHIP_ID {
            if self.strict_chip_id {
                return Err(SensorError::WrongChipId {
                    sensor: self.id.clone(),
                    expected: CHIP_ID,
                    actual: chip_id,
                });
            }
            warn!("[{}] chip ID {:#04x} is not a GC0308, continuing", self.id, chip_id);
        }

        // informational only
        match self.read_reg(bus, REG_OUTPUT_FORMAT).await {
            Ok(value) => {
                info!("[{}] output format register is {:#04x}", self.id, value);
                self.output_format_reg = Some(value);
            }
            Err(e) => warn!("[{}] {}", self.id, e),
        }

        self.init_device(bus).await
    }

    async fn abort_probe(&mut self) {
        self.clock.disable();
        self.on = false;
        if let Err(e) = self.power_down(true).await {
            warn!("[{}] could not power down after failed probe: {}", self.id, e);
        }
    }
}

#[async_trait]
impl<P> SubdevDriver for Gc0308<P>
where
    P: OutputPin + Send + Sync,
{
    async fn probe(&mut self, bus: &mut dyn RegisterBus) -> SensorResult<()> {
        let mclk = clamp_mclk(self.mclk);
        self.mclk = mclk;
        debug!("[{}] setting mclk to {} MHz", self.id, mclk / 1_000_000);
        if let Err(e) = self.clock.set_rate(mclk) {
            debug!("[{}] {}, running at {} Hz", self.id, e, self.clock.rate());
        }
        self.clock.enable();

        if let Err(e) = self.bring_up(bus).await {
            warn!("[{}] camera init failed: {}", self.id, e);
            self.abort_probe().await;
            return Err(e);
        }

        // the pipeline turns the clock back on through s_power
        self.clock.disable();
        self.on = false;

        info!("[{}] GC0308 found on {} at {:#04x}", self.id, self.bus_id, self.address);
        Ok(())
    }

    async fn remove(&mut self) -> SensorResult<()> {
        if self.clock.is_enabled() {
            self.clock.disable();
        }
        self.on = false;
        self.power_down(true).await
    }

    fn s_power(&mut self, on: bool) -> SensorResult<()> {
        if on {
            self.clock.enable();
        } else {
            self.clock.disable();
        }
        self.on = on;
        Ok(())
    }

    fn g_parm(&self, buf_type: BufType) -> SensorResult<StreamParm> {
        match buf_type {
            BufType::VideoCapture => Ok(StreamParm { buf_type, capture: self.streamcap }),
            other => Err(SensorError::UnsupportedBufType { sensor: self.id.clone(), buf_type: other }),
        }
    }

    fn s_parm(&mut self, mut parm: StreamParm) -> SensorResult<StreamParm> {
        if parm.buf_type != BufType::VideoCapture {
            debug!("[{}] s_parm: type is {:?}, not video capture", self.id, parm.buf_type);
            return Err(SensorError::UnsupportedBufType { sensor: self.id.clone(), buf_type: parm.buf_type });
        }

        let tpf = &mut parm.capture.time_per_frame;
        if tpf.numerator == 0 || tpf.denominator == 0 {
            *tpf = Fract::per_second(DEFAULT_FPS);
        }

        let requested = tpf.denominator / tpf.numerator;
        if requested > MAX_FPS {
            *tpf = Fract::per_second(MAX_FPS);
        } else if requested < MIN_FPS {
            *tpf = Fract::per_second(MIN_FPS);
        }

        // Actual frame rate we use
        let fps = tpf.denominator / tpf.numerator;
        let frame_rate = FrameRate::from_fps(fps).ok_or_else(|| SensorError::UnsupportedFrameRate {
            sensor: self.id.clone(),
            fps,
        })?;

        self.streamcap.time_per_frame = *tpf;
        self.streamcap.capture_mode = parm.capture.capture_mode;
        self.frame_rate = frame_rate;
        debug!("[{}] frame rate set to {} fps", self.id, fps);
        Ok(parm)
    }

    fn try_fmt(&self, mut fmt: MbusFrameFmt) -> MbusFrameFmt {
        if find_datafmt(fmt.code).is_none() {
            fmt.code = COLOUR_FMTS[0].code;
            fmt.colorspace = COLOUR_FMTS[0].colorspace;
        }
        fmt.field = Field::None;
        fmt.width = self.pix.width;
        fmt.height = self.pix.height;
        fmt
    }

    fn s_fmt(&mut self, fmt: MbusFrameFmt) -> SensorResult<MbusFrameFmt> {
        // the receiver may have changed the format, double-check
        let found = find_datafmt(fmt.code).ok_or_else(|| SensorError::UnsupportedFormat {
            sensor: self.id.clone(),
            code: fmt.code,
        })?;

        let fmt = self.try_fmt(fmt);
        self.fmt = found;
        Ok(fmt)
    }

    fn g_fmt(&self) -> MbusFrameFmt {
        MbusFrameFmt {
            width: self.pix.width,
            height: self.pix.height,
            code: self.fmt.code,
            field: Field::None,
            colorspace: self.fmt.colorspace,
        }
    }

    fn enum_fmt(&self, index: u32) -> SensorResult<u32> {
        COLOUR_FMTS
            .get(index as usize)
            .map(|f| f.code)
            .ok_or_else(|| SensorError::IndexOutOfRange { sensor: self.id.clone(), what: "format", index })
    }

    fn enum_framesizes(&self, index: u32) -> SensorResult<FrameSize> {
        let mode = index as usize;
        if mode >= MODE_COUNT {
            return Err(SensorError::IndexOutOfRange { sensor: self.id.clone(), what: "frame size", index });
        }

        Ok(FrameSize {
            width: MODE_INFO.iter().map(|modes| modes[mode].width).max().unwrap_or(0),
            height: MODE_INFO.iter().map(|modes| modes[mode].height).max().unwrap_or(0),
        })
    }

    fn enum_frameintervals(&self, query: &FrameIntervalQuery) -> SensorResult<Fract> {
        if query.width == 0 || query.height == 0 || query.pixel_format == 0 {
            warn!("[{}] frame interval query must set pixel format, width and height", self.id);
            return Err(SensorError::IncompleteQuery { sensor: self.id.clone() });
        }

        FrameRate::ALL
            .iter()
            .flat_map(|rate| MODE_INFO[rate.index()].iter().map(move |mode| (*rate, mode)))
            .filter(|(_, mode)| {
                query.pixel_format == self.pix.pixelformat
                    && query.width == mode.width
                    && query.height == mode.height
            })
            .nth(query.index as usize)
            .map(|(rate, _)| Fract::per_second(rate.fps()))
            .ok_or_else(|| SensorError::IndexOutOfRange {
                sensor: self.id.clone(),
                what: "frame interval",
                index: query.index,
            })
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn bus(&self) -> &str {
        &self.bus_id
    }

    fn driver(&self) -> &'static str {
        DRIVER_NAME
    }

    fn is_powered(&self) -> bool {
        self.on
    }

    fn status(&self) -> SubdevStatus {
        SubdevStatus {
            id: self.id.clone(),
            driver: DRIVER_NAME,
            bus: self.bus_id.clone(),
            address: self.address,
            powered: self.on,
            chip_id: self.chip_id,
            output_format_reg: self.output_format_reg,
            mclk_hz: self.mclk,
            mclk_source: self.mclk_source,
            csi_id: self.csi,
            frame_rate: self.frame_rate.fps(),
            tuning: self.tuning.name(),
        }
    }
}
