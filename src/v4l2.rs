//! V4L2 value types exchanged with the capture pipeline.
//!
//! Numeric values follow the Linux UAPI headers so they can travel over
//! the control service unchanged.

use crate::errors::SensorError;

/// Build a V4L2 fourcc pixel format code
pub const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*code)
}

/// YUYV 4:2:2 packed pixel format
pub const V4L2_PIX_FMT_YUYV: u32 = fourcc(b"YUYV");

/// Media bus code for YUYV, two 8-bit samples per pixel
pub const MEDIA_BUS_FMT_YUYV8_2X8: u32 = 0x2008;

/// Capture capability: high quality imaging mode
pub const V4L2_MODE_HIGHQUALITY: u32 = 0x0001;
/// Capture capability: time-per-frame is configurable
pub const V4L2_CAP_TIMEPERFRAME: u32 = 0x1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BufType {
    VideoCapture = 1,
    VideoOutput = 2,
    VideoOverlay = 3,
    VbiCapture = 4,
    VbiOutput = 5,
    SlicedVbiCapture = 6,
    SlicedVbiOutput = 7,
}

impl TryFrom<u32> for BufType {
    type Error = SensorError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => BufType::VideoCapture,
            2 => BufType::VideoOutput,
            3 => BufType::VideoOverlay,
            4 => BufType::VbiCapture,
            5 => BufType::VbiOutput,
            6 => BufType::SlicedVbiCapture,
            7 => BufType::SlicedVbiOutput,
            _ => return Err(SensorError::UnknownValue { kind: "buffer type", value }),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Field {
    Any = 0,
    None = 1,
    Top = 2,
    Bottom = 3,
    Interlaced = 4,
    SeqTb = 5,
    SeqBt = 6,
    Alternate = 7,
    InterlacedTb = 8,
    InterlacedBt = 9,
}

impl TryFrom<u32> for Field {
    type Error = SensorError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Field::Any,
            1 => Field::None,
            2 => Field::Top,
            3 => Field::Bottom,
            4 => Field::Interlaced,
            5 => Field::SeqTb,
            6 => Field::SeqBt,
            7 => Field::Alternate,
            8 => Field::InterlacedTb,
            9 => Field::InterlacedBt,
            _ => return Err(SensorError::UnknownValue { kind: "field", value }),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Colorspace {
    Default = 0,
    Smpte170m = 1,
    Smpte240m = 2,
    Rec709 = 3,
    Bt878 = 4,
    System470M = 5,
    System470Bg = 6,
    Jpeg = 7,
    Srgb = 8,
    Oprgb = 9,
    Bt2020 = 10,
    Raw = 11,
    DciP3 = 12,
}

impl TryFrom<u32> for Colorspace {
    type Error = SensorError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Colorspace::Default,
            1 => Colorspace::Smpte170m,
            2 => Colorspace::Smpte240m,
            3 => Colorspace::Rec709,
            4 => Colorspace::Bt878,
            5 => Colorspace::System470M,
            6 => Colorspace::System470Bg,
            7 => Colorspace::Jpeg,
            8 => Colorspace::Srgb,
            9 => Colorspace::Oprgb,
            10 => Colorspace::Bt2020,
            11 => Colorspace::Raw,
            12 => Colorspace::DciP3,
            _ => return Err(SensorError::UnknownValue { kind: "colorspace", value }),
        })
    }
}

/// A time-per-frame fraction, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fract {
    pub numerator: u32,
    pub denominator: u32,
}

impl Fract {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self { numerator, denominator }
    }

    /// Interval of one frame at `fps` frames per second
    pub const fn per_second(fps: u32) -> Self {
        Self { numerator: 1, denominator: fps }
    }

    /// Whole frames per second, `None` for a zero numerator
    pub fn fps(&self) -> Option<u32> {
        self.denominator.checked_div(self.numerator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureParm {
    pub capability: u32,
    pub capture_mode: u32,
    pub time_per_frame: Fract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParm {
    pub buf_type: BufType,
    pub capture: CaptureParm,
}

/// Frame format on the media bus between sensor and receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbusFrameFmt {
    pub width: u32,
    pub height: u32,
    pub code: u32,
    pub field: Field,
    pub colorspace: Colorspace,
}

/// Pixel format delivered to memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixFormat {
    pub width: u32,
    pub height: u32,
    pub pixelformat: u32,
}

/// A media bus code together with the colorspace it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFormat {
    pub code: u32,
    pub colorspace: Colorspace,
}

/// A discrete frame size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Frame interval enumeration request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIntervalQuery {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_format: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuyv_fourcc_matches_uapi() {
        assert_eq!(V4L2_PIX_FMT_YUYV, 0x5659_5559);
    }

    #[test]
    fn fract_fps_handles_zero_numerator() {
        assert_eq!(Fract::per_second(30).fps(), Some(30));
        assert_eq!(Fract::new(2, 45).fps(), Some(22));
        assert_eq!(Fract::new(0, 30).fps(), None);
    }

    #[test]
    fn unknown_uapi_values_are_rejected() {
        assert_eq!(BufType::try_from(1).unwrap(), BufType::VideoCapture);
        assert!(BufType::try_from(0).is_err());
        assert!(BufType::try_from(9).is_err());
        assert_eq!(Field::try_from(1).unwrap(), Field::None);
        assert!(Field::try_from(10).is_err());
        assert_eq!(Colorspace::try_from(7).unwrap(), Colorspace::Jpeg);
        assert!(Colorspace::try_from(13).is_err());
    }
}
