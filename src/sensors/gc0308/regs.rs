//! Vendor register tables and the mode table for the GC0308.
//!
//! Each table is replayed verbatim, in order, over I2C. Register 0xfe
//! selects the register page; the other registers hold analog settings,
//! anti-flicker steps, AEC/AWB targets, lens shading, gamma and the colour
//! correction matrix as tuned by the sensor vendor.

use super::{FrameRate, MODE_COUNT};

/// One register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegValue {
    pub addr: u8,
    pub val: u8,
}

const fn r(addr: u8, val: u8) -> RegValue {
    RegValue { addr, val }
}

/// Named register table selected by the `tuning` config key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tuning {
    /// 24 MHz MCLK table used for every mode
    #[default]
    Default,
    /// Alternative VGA table, 50 Hz anti-flicker at 24 MHz MCLK
    Vga30fps,
}

impl Tuning {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Tuning::Default),
            "vga_30fps" => Some(Tuning::Vga30fps),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tuning::Default => "default",
            Tuning::Vga30fps => "vga_30fps",
        }
    }

    pub fn table(self) -> &'static [RegValue] {
        match self {
            Tuning::Default => DEFAULT_SETTING,
            Tuning::Vga30fps => VGA_30FPS_SETTING,
        }
    }
}

/// Output geometry of a sensor mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeInfo {
    pub width: u32,
    pub height: u32,
}

const VGA: ModeInfo = ModeInfo { width: 640, height: 480 };

/// Mode geometry per frame rate, indexed by `FrameRate::index()` then mode
pub static MODE_INFO: [[ModeInfo; MODE_COUNT]; FrameRate::ALL.len()] = [[VGA], [VGA]];

pub static DEFAULT_SETTING: &[RegValue] = &[
    r(0xfe, 0x00),

    r(0x0f, 0x05), r(0x01, 0xe1), r(0x02, 0x70), r(0xe2, 0x00), r(0xe3, 0x96), r(0xe4, 0x02),
    r(0xe5, 0x58), r(0xe6, 0x02), r(0xe7, 0x58), r(0xe8, 0x02), r(0xe9, 0x58), r(0xea, 0x0e),
    r(0xeb, 0xa6), r(0xfe, 0x00), r(0xec, 0x20), r(0x05, 0x00), r(0x06, 0x00), r(0x07, 0x00),
    r(0x08, 0x00), r(0x09, 0x01), r(0x0a, 0xe8), r(0x0b, 0x02), r(0x0c, 0x88), r(0x0d, 0x02),
    r(0x0e, 0x02), r(0x10, 0x26), r(0x11, 0x0d), r(0x12, 0x2a), r(0x13, 0x00), r(0x14, 0x11),
    r(0x15, 0x0a), r(0x16, 0x05), r(0x17, 0x01), r(0x18, 0x44), r(0x19, 0x44), r(0x1a, 0x2a),
    r(0x1b, 0x00), r(0x1c, 0x49), r(0x1d, 0x9a), r(0x1e, 0x61), r(0x1f, 0x00), r(0x20, 0x7f),
    r(0x21, 0xfa), r(0x22, 0x57), r(0x24, 0xa2), r(0x25, 0x0f), r(0x26, 0x03), r(0x28, 0x00),
    r(0x2d, 0x0a), r(0x2f, 0x01), r(0x30, 0xf7), r(0x31, 0x50), r(0x32, 0x00), r(0x33, 0x28),
    r(0x34, 0x2a), r(0x35, 0x28), r(0x39, 0x04), r(0x3a, 0x20), r(0x3b, 0x20), r(0x3c, 0x00),
    r(0x3d, 0x00), r(0x3e, 0x00), r(0x3f, 0x00), r(0x50, 0x14), r(0x52, 0x41), r(0x53, 0x80),
    r(0x54, 0x80), r(0x55, 0x80), r(0x56, 0x80), r(0x8b, 0x20), r(0x8c, 0x20), r(0x8d, 0x20),
    r(0x8e, 0x14), r(0x8f, 0x10), r(0x90, 0x14), r(0x91, 0x3c), r(0x92, 0x50),

    r(0x5d, 0x12), r(0x5e, 0x1a), r(0x5f, 0x24), r(0x60, 0x07), r(0x61, 0x15), r(0x62, 0x08),
    r(0x64, 0x03), r(0x66, 0xe8), r(0x67, 0x86), r(0x68, 0x82), r(0x69, 0x18), r(0x6a, 0x0f),
    r(0x6b, 0x00), r(0x6c, 0x5f), r(0x6d, 0x8f), r(0x6e, 0x55), r(0x6f, 0x38), r(0x70, 0x15),
    r(0x71, 0x33), r(0x72, 0xdc), r(0x73, 0x00), r(0x74, 0x02), r(0x75, 0x3f), r(0x76, 0x02),
    r(0x77, 0x38), r(0x78, 0x88), r(0x79, 0x81), r(0x7a, 0x81), r(0x7b, 0x22), r(0x7c, 0xff),
    r(0x93, 0x48), r(0x94, 0x02), r(0x95, 0x07), r(0x96, 0xe0), r(0x97, 0x40), r(0x98, 0xf0),
    r(0xb1, 0x40), r(0xb2, 0x40), r(0xb3, 0x40), r(0xb6, 0xe0), r(0xbd, 0x38), r(0xbe, 0x36),
    r(0xd0, 0xcb), r(0xd1, 0x10), r(0xd2, 0x90), r(0xd3, 0x48), r(0xd5, 0xf2), r(0xd6, 0x16),
    r(0xdb, 0x92), r(0xdc, 0xa5), r(0xdf, 0x23), r(0xd9, 0x00), r(0xda, 0x00), r(0xe0, 0x09),
    r(0xed, 0x04), r(0xee, 0xa0), r(0xef, 0x40), r(0x80, 0x03),

    r(0x9f, 0x10), r(0xa0, 0x20), r(0xa1, 0x38), r(0xa2, 0x4e), r(0xa3, 0x63), r(0xa4, 0x76),
    r(0xa5, 0x87), r(0xa6, 0xa2), r(0xa7, 0xb8), r(0xa8, 0xca), r(0xa9, 0xd8), r(0xaa, 0xe3),
    r(0xab, 0xeb), r(0xac, 0xf0), r(0xad, 0xf8), r(0xae, 0xfd), r(0xaf, 0xff),

    r(0xc0, 0x00), r(0xc1, 0x10), r(0xc2, 0x1c), r(0xc3, 0x30), r(0xc4, 0x43), r(0xc5, 0x54),
    r(0xc6, 0x65), r(0xc7, 0x75), r(0xc8, 0x93), r(0xc9, 0xb0), r(0xca, 0xcb), r(0xcb, 0xe6),
    r(0xcc, 0xff), r(0xf0, 0x02), r(0xf1, 0x01), r(0xf2, 0x02), r(0xf3, 0x30), r(0xf7, 0x12),
    r(0xf8, 0x0a), r(0xf9, 0x9f), r(0xfa, 0x78), r(0xfe, 0x01), r(0x00, 0xf5), r(0x02, 0x20),
    r(0x04, 0x10), r(0x05, 0x08), r(0x06, 0x20), r(0x08, 0x0a), r(0x0a, 0xa0), r(0x0b, 0x60),
    r(0x0c, 0x08), r(0x0e, 0x44), r(0x0f, 0x32), r(0x10, 0x41), r(0x11, 0x37), r(0x12, 0x22),
    r(0x13, 0x19), r(0x14, 0x44), r(0x15, 0x44), r(0x16, 0xc2), r(0x17, 0xa8), r(0x18, 0x18),
    r(0x19, 0x50), r(0x1a, 0xd8), r(0x1b, 0xf5), r(0x70, 0x40), r(0x71, 0x58), r(0x72, 0x30),
    r(0x73, 0x48), r(0x74, 0x20), r(0x75, 0x60), r(0x77, 0x20), r(0x78, 0x32), r(0x30, 0x03),
    r(0x31, 0x40), r(0x32, 0x10), r(0x33, 0xe0), r(0x34, 0xe0), r(0x35, 0x00), r(0x36, 0x80),
    r(0x37, 0x00), r(0x38, 0x04), r(0x39, 0x09), r(0x3a, 0x12), r(0x3b, 0x1c), r(0x3c, 0x28),
    r(0x3d, 0x31), r(0x3e, 0x44), r(0x3f, 0x57), r(0x40, 0x6c), r(0x41, 0x81), r(0x42, 0x94),
    r(0x43, 0xa7), r(0x44, 0xb8), r(0x45, 0xd6), r(0x46, 0xee), r(0x47, 0x0d), r(0x62, 0xf7),
    r(0x63, 0x68), r(0x64, 0xd3), r(0x65, 0xd3), r(0x66, 0x60), r(0xfe, 0x00),
];

pub static VGA_30FPS_SETTING: &[RegValue] = &[
    r(0xfe, 0x80), r(0xfe, 0x00), r(0x22, 0x55), r(0x03, 0x02), r(0x04, 0x58), r(0x5a, 0x56),
    r(0x5b, 0x40), r(0x5c, 0x4a), r(0x22, 0x57),

    r(0x01, 0x6a), r(0x02, 0x70), r(0x0f, 0x01),

    r(0xe2, 0x00), r(0xe3, 0x78),

    r(0xe4, 0x02), r(0xe5, 0x58), r(0xe6, 0x03), r(0xe7, 0x48), r(0xe8, 0x04), r(0xe9, 0xb0),
    r(0xea, 0x05), r(0xeb, 0xa0),

    r(0x05, 0x00), r(0x06, 0x00), r(0x07, 0x00), r(0x08, 0x02), r(0x09, 0x01), r(0x0a, 0xea),
    r(0x0b, 0x02), r(0x0c, 0x88), r(0x0d, 0x02), r(0x0e, 0x02), r(0x10, 0x26), r(0x11, 0x0d),
    r(0x12, 0x2a), r(0x13, 0x00), r(0x14, 0x13), r(0x15, 0x0a), r(0x16, 0x05), r(0x17, 0x01),
    r(0x18, 0x44), r(0x19, 0x44), r(0x1a, 0x2a), r(0x1b, 0x00), r(0x1c, 0x49), r(0x1d, 0x9a),
    r(0x1e, 0x61), r(0x1f, 0x16), r(0x20, 0xff), r(0x21, 0xf8), r(0x22, 0x57), r(0x24, 0xa2),
    r(0x25, 0x0f), r(0x26, 0x03), r(0x2f, 0x01), r(0x30, 0xf7), r(0x31, 0x50), r(0x32, 0x00),
    r(0x39, 0x04), r(0x3a, 0x20), r(0x3b, 0x20), r(0x3c, 0x02), r(0x3d, 0x02), r(0x3e, 0x02),
    r(0x3f, 0x02), r(0x50, 0x14), r(0x53, 0x80), r(0x54, 0x87), r(0x55, 0x87), r(0x56, 0x80),

    r(0x57, 0x7a), r(0x58, 0x7e), r(0x59, 0x84),

    r(0x8b, 0x10), r(0x8c, 0x10), r(0x8d, 0x10), r(0x8e, 0x10), r(0x8f, 0x10), r(0x90, 0x10),
    r(0x91, 0x3c), r(0x92, 0x50), r(0x5d, 0x12), r(0x5e, 0x1a), r(0x5f, 0x24), r(0x60, 0x07),
    r(0x61, 0x15), r(0x62, 0x08), r(0x64, 0x03), r(0x66, 0xe8), r(0x67, 0x86), r(0x68, 0xa2),
    r(0x69, 0x18), r(0x6a, 0x0f), r(0x6b, 0x00), r(0x6c, 0x5f), r(0x6d, 0x8f), r(0x6e, 0x55),
    r(0x6f, 0x38), r(0x70, 0x15), r(0x71, 0x33), r(0x72, 0xdc), r(0x73, 0x80), r(0x74, 0x02),
    r(0x75, 0x3f), r(0x76, 0x02), r(0x77, 0x45), r(0x78, 0x88), r(0x79, 0x81), r(0x7a, 0x81),
    r(0x7b, 0x22), r(0x7c, 0xff),

    r(0x93, 0x42), r(0x94, 0x00), r(0x95, 0x0c), r(0x96, 0xe0), r(0x97, 0x46), r(0x98, 0xf3),

    r(0xb1, 0x40), r(0xb2, 0x40), r(0xb3, 0x3c), r(0xb5, 0x00), r(0xb6, 0xe0), r(0xbd, 0x3c),
    r(0xbe, 0x36), r(0xd0, 0xcb), r(0xd1, 0x10), r(0xd2, 0x90), r(0xd3, 0x50), r(0xd5, 0xf2),
    r(0xd6, 0x10), r(0xdb, 0x92), r(0xdc, 0xa5), r(0xdf, 0x23), r(0xd9, 0x00), r(0xda, 0x00),
    r(0xe0, 0x09), r(0xed, 0x04), r(0xee, 0xa0), r(0xef, 0x40), r(0x80, 0x03),

    r(0x9f, 0x10), r(0xa0, 0x20), r(0xa1, 0x38), r(0xa2, 0x4e), r(0xa3, 0x63), r(0xa4, 0x76),
    r(0xa5, 0x87), r(0xa6, 0xa2), r(0xa7, 0xb8), r(0xa8, 0xca), r(0xa9, 0xd8), r(0xaa, 0xe3),
    r(0xab, 0xeb), r(0xac, 0xf0), r(0xad, 0xf8), r(0xae, 0xfd), r(0xaf, 0xff),

    r(0xc0, 0x00), r(0xc1, 0x14), r(0xc2, 0x21), r(0xc3, 0x36), r(0xc4, 0x49), r(0xc5, 0x5b),
    r(0xc6, 0x6b), r(0xc7, 0x7b), r(0xc8, 0x98), r(0xc9, 0xb4), r(0xca, 0xce), r(0xcb, 0xe8),
    r(0xcc, 0xff), r(0xf0, 0x02), r(0xf1, 0x01), r(0xf2, 0x01), r(0xf3, 0x30), r(0xf9, 0x9f),
    r(0xfa, 0x78), r(0xfe, 0x01), r(0x00, 0xf5), r(0x02, 0x20), r(0x04, 0x10), r(0x05, 0x10),
    r(0x06, 0x20), r(0x08, 0x15), r(0x0a, 0xa0), r(0x0b, 0x64), r(0x0c, 0x08), r(0x0e, 0x4c),
    r(0x0f, 0x39), r(0x10, 0x41), r(0x11, 0x37), r(0x12, 0x24), r(0x13, 0x39), r(0x14, 0x45),
    r(0x15, 0x45), r(0x16, 0xc2), r(0x17, 0xa8), r(0x18, 0x18), r(0x19, 0x55), r(0x1a, 0xd8),
    r(0x1b, 0xf5),

    r(0x1c, 0x60),

    r(0x70, 0x40), r(0x71, 0x58), r(0x72, 0x30), r(0x73, 0x48), r(0x74, 0x20), r(0x75, 0x60),
    r(0x77, 0x20), r(0x78, 0x32), r(0x30, 0x03), r(0x31, 0x40), r(0x32, 0x10), r(0x33, 0xe0),
    r(0x34, 0xe0), r(0x35, 0x00), r(0x36, 0x80), r(0x37, 0x00), r(0x38, 0x04), r(0x39, 0x09),
    r(0x3a, 0x12), r(0x3b, 0x1c), r(0x3c, 0x28), r(0x3d, 0x31), r(0x3e, 0x44), r(0x3f, 0x57),
    r(0x40, 0x6c), r(0x41, 0x81), r(0x42, 0x94), r(0x43, 0xa7), r(0x44, 0xb8), r(0x45, 0xd6),
    r(0x46, 0xee), r(0x47, 0x0d), r(0xfe, 0x00),

    r(0x10, 0x26), r(0x11, 0x0d), r(0x1a, 0x2a),

    r(0x1c, 0x49), r(0x1d, 0x9a), r(0x1e, 0x61),

    r(0x3a, 0x20),

    r(0x50, 0x14), r(0x53, 0x80), r(0x56, 0x80),

    r(0x8b, 0x20), r(0x8c, 0x20), r(0x8d, 0x20), r(0x8e, 0x14), r(0x8f, 0x10), r(0x90, 0x14),

    r(0x94, 0x02), r(0x95, 0x0c), r(0x96, 0xe0),

    r(0xb1, 0x40), r(0xb2, 0x40), r(0xb3, 0x3c), r(0xb6, 0xe0),

    r(0xd0, 0xcb), r(0xd3, 0x50),

    r(0xf2, 0x02), r(0xf7, 0x12), r(0xf8, 0x0a),

    r(0xfe, 0x01),

    r(0x02, 0x20), r(0x04, 0x10), r(0x05, 0x08), r(0x06, 0x20), r(0x08, 0x0a),

    r(0x0e, 0x44), r(0x0f, 0x32), r(0x10, 0x41), r(0x11, 0x37), r(0x12, 0x22), r(0x13, 0x19),
    r(0x14, 0x44), r(0x15, 0x44),

    r(0x19, 0x50), r(0x1a, 0xd8),

    r(0x32, 0x10),

    r(0x35, 0x00), r(0x36, 0x80), r(0x37, 0x00),

    r(0xfe, 0x00), r(0xfe, 0x00),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_have_expected_lengths() {
        assert_eq!(DEFAULT_SETTING.len(), 236);
        assert_eq!(VGA_30FPS_SETTING.len(), 284);
    }

    #[test]
    fn tables_start_on_page_zero_and_end_on_page_zero() {
        for table in [DEFAULT_SETTING, VGA_30FPS_SETTING] {
            assert_eq!(table.last(), Some(&r(0xfe, 0x00)));
        }
        assert_eq!(DEFAULT_SETTING[0], r(0xfe, 0x00));
        // the VGA table opens with a soft reset
        assert_eq!(VGA_30FPS_SETTING[0], r(0xfe, 0x80));
        assert_eq!(VGA_30FPS_SETTING[1], r(0xfe, 0x00));
    }

    #[test]
    fn both_tables_select_ycbycr_output() {
        for table in [DEFAULT_SETTING, VGA_30FPS_SETTING] {
            assert!(table.contains(&r(0x24, 0xa2)));
        }
    }

    #[test]
    fn tuning_names_round_trip() {
        for t in [Tuning::Default, Tuning::Vga30fps] {
            assert_eq!(Tuning::from_name(t.name()), Some(t));
        }
        assert_eq!(Tuning::from_name("night"), None);
        assert_eq!(Tuning::Vga30fps.table().len(), VGA_30FPS_SETTING.len());
    }
}
