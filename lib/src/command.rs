//! The command set of the SSD1306.
//!
//! Every physical write starts with a control byte. Commands are sent one byte per write
//! behind [`CONTROL_COMMAND`], pixel data is sent in bulk behind [`CONTROL_DATA`].

use crate::error::{Error, invalid};

/// control byte selecting command interpretation of the following byte
pub const CONTROL_COMMAND: u8 = 0x00;
/// control byte selecting display ram interpretation of all following bytes
pub const CONTROL_DATA: u8 = 0x40;

/// default 7-bit device address, `0x3d` when the SA0 pin is pulled high
pub const DEFAULT_ADDRESS: u8 = 0x3c;
pub const ALTERNATE_ADDRESS: u8 = 0x3d;

pub mod opcode {
    pub const SET_CONTRAST: u8 = 0x81;
    pub const DISPLAY_TEST_OFF: u8 = 0xa4;
    pub const DISPLAY_TEST_ON: u8 = 0xa5;
    pub const NORMAL: u8 = 0xa6;
    pub const INVERSE: u8 = 0xa7;
    pub const DISPLAY_OFF: u8 = 0xae;
    pub const DISPLAY_ON: u8 = 0xaf;

    pub const HORIZONTAL_SCROLL_RIGHT: u8 = 0x26;
    pub const HORIZONTAL_SCROLL_LEFT: u8 = 0x27;
    pub const DIAGONAL_SCROLL_RIGHT: u8 = 0x29;
    pub const DIAGONAL_SCROLL_LEFT: u8 = 0x2a;
    pub const SCROLL_OFF: u8 = 0x2e;
    pub const SCROLL_ON: u8 = 0x2f;
    pub const SET_VERTICAL_SCROLL_AREA: u8 = 0xa3;

    pub const SET_LOW_COLUMN: u8 = 0x00;
    pub const SET_HIGH_COLUMN: u8 = 0x10;
    pub const SET_MEMORY_MODE: u8 = 0x20;
    pub const SET_COLUMN_ADDRESS: u8 = 0x21;
    pub const SET_PAGE_ADDRESS: u8 = 0x22;
    pub const SET_PAGE_START: u8 = 0xb0;

    pub const SET_START_LINE: u8 = 0x40;
    pub const SEGMENT_REMAP_NORMAL: u8 = 0xa0;
    pub const SEGMENT_REMAP_REVERSE: u8 = 0xa1;
    pub const SET_MUX_RATIO: u8 = 0xa8;
    pub const COM_SCAN_NORMAL: u8 = 0xc0;
    pub const COM_SCAN_REVERSE: u8 = 0xc8;
    pub const SET_DISPLAY_OFFSET: u8 = 0xd3;
    pub const SET_COM_PINS: u8 = 0xda;

    pub const SET_CLOCK_DIV: u8 = 0xd5;
    pub const SET_PRECHARGE: u8 = 0xd9;
    pub const SET_VCOMH_DESELECT: u8 = 0xdb;
    pub const NOP: u8 = 0xe3;

    pub const SET_FADE: u8 = 0x23;
    pub const SET_ZOOM: u8 = 0xd6;
    pub const SET_CHARGE_PUMP: u8 = 0x8d;
}

/// How successive data bytes advance the ram pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// Column first, wrapping to the next page at the end of the column range.
    Horizontal = 0x00,
    /// Page first, wrapping to the next column at the end of the page range.
    Vertical = 0x01,
    /// Column only, the page pointer never moves. This is the power-on mode.
    Page = 0x02,
}

impl TryFrom<u8> for AddressingMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(AddressingMode::Horizontal),
            0x01 => Ok(AddressingMode::Vertical),
            0x02 => Ok(AddressingMode::Page),
            _ => Err(invalid("addressing mode", value, "0 (horizontal), 1 (vertical) or 2 (page)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Right,
    Left,
}

/// Number of frames between two scroll steps.
///
/// The register code is a fixed table from the datasheet, the codes are not ordered by speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollInterval {
    frames: u16,
    code: u8,
}

impl ScrollInterval {
    pub const SUPPORTED_FRAMES: [u16; 8] = [2, 3, 4, 5, 25, 64, 128, 256];

    pub fn from_frames(frames: u16) -> Result<Self, Error> {
        let code = match frames {
            2 => 0x07,
            3 => 0x04,
            4 => 0x05,
            5 => 0x00,
            25 => 0x06,
            64 => 0x01,
            128 => 0x02,
            256 => 0x03,
            _ => Err(invalid("scroll interval", frames, "one of 2, 3, 4, 5, 25, 64, 128 or 256 frames"))?,
        };
        Ok(Self { frames, code })
    }

    pub fn frames(&self) -> u16 {
        self.frames
    }

    pub fn code(&self) -> u8 {
        self.code
    }
}

/// Deselect level of the COM signal, encoded in bits 6:4 of the register.
///
/// The datasheet only documents voltages for three codes but every code up to 7 is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VcomhLevel(u8);

impl VcomhLevel {
    /// ~0.65 x VCC
    pub const MV_650: Self = Self(0x00);
    /// ~0.77 x VCC, the reset value
    pub const MV_770: Self = Self(0x02);
    /// ~0.83 x VCC
    pub const MV_830: Self = Self(0x03);

    pub fn new(code: u8) -> Result<Self, Error> {
        if code > 0x07 {
            Err(invalid("vcomh level", code, "a level code up to 7"))?
        }
        Ok(Self(code))
    }

    pub fn code(&self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeMode {
    Off = 0x00,
    FadeOut = 0x20,
    Blink = 0x30,
}

bitflags::bitflags! {
    /// contents of the status register, all bits except `DISPLAY_OFF` are reserved
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        const DISPLAY_OFF = 1 << 6;
    }
}
