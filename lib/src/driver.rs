//! SSD1306 protocol driver.
//!
//! The controller registers are write-only from our side, so nothing is cached here: every
//! setter sends a fresh command and every `reset_*` sends the datasheet default. A known
//! register state is only reached through [`Ssd1306::soft_reset`] or [`Ssd1306::init`].
//!
//! Parameters are validated before anything is sent, so an invalid call never leaves a
//! multi-byte command half written.

use crate::{
    bus::Bus,
    command::{
        AddressingMode, CONTROL_COMMAND, CONTROL_DATA, FadeMode, ScrollDirection, ScrollInterval, Status, VcomhLevel,
        opcode,
    },
    error::{Error, invalid},
    geometry::Geometry,
    packer::PackedBitmap,
};

pub const DEFAULT_CONTRAST: u8 = 0x7f;
pub const DEFAULT_MUX_RATIO: u8 = 64;
pub const DEFAULT_CLOCK_DIVIDE: u8 = 1;
pub const DEFAULT_OSCILLATOR: u8 = 8;
pub const DEFAULT_PRECHARGE: (u8, u8) = (2, 2);
pub const DEFAULT_FADE_INTERVAL: u8 = 8;
/// rows in the fixed top area and scrolling area after reset
pub const DEFAULT_SCROLL_AREA: (u8, u8) = (0, 64);

/// longest command takes 6 parameter bytes, this many no-ops flush any of them
const FLUSH_NOPS: usize = 6;

const MAX_COLUMN: u8 = 127;
const MAX_PAGE: u8 = 7;
const MAX_ROW: u8 = 63;

type Step<'a, B> = (&'static str, &'a dyn Fn(&mut Ssd1306<B>) -> Result<(), Error>);

pub struct Ssd1306<B: Bus> {
    bus: B,
}

impl<B: Bus> Ssd1306<B> {
    /// wrap an already selected bus, no traffic is generated
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    pub fn close(&mut self) {
        self.bus.close();
    }

    /// send a single command byte as its own transfer
    fn command(&mut self, byte: u8) -> Result<(), Error> {
        self.bus.write(&[CONTROL_COMMAND, byte])
    }

    /// send a command and its parameters, one transfer per byte, stopping at the first failure
    fn commands(&mut self, bytes: &[u8]) -> Result<(), Error> {
        bytes.iter().try_for_each(|byte| self.command(*byte))
    }

    pub fn nop(&mut self) -> Result<(), Error> {
        self.command(opcode::NOP)
    }

    // fundamentals

    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), Error> {
        self.commands(&[opcode::SET_CONTRAST, contrast])
    }

    pub fn reset_contrast(&mut self) -> Result<(), Error> {
        self.set_contrast(DEFAULT_CONTRAST)
    }

    /// light every pixel regardless of the ram contents
    pub fn set_display_test(&mut self, enable: bool) -> Result<(), Error> {
        self.command(if enable { opcode::DISPLAY_TEST_ON } else { opcode::DISPLAY_TEST_OFF })
    }

    pub fn reset_display_test(&mut self) -> Result<(), Error> {
        self.set_display_test(false)
    }

    pub fn set_inverse(&mut self, enable: bool) -> Result<(), Error> {
        self.command(if enable { opcode::INVERSE } else { opcode::NORMAL })
    }

    pub fn reset_inverse(&mut self) -> Result<(), Error> {
        self.set_inverse(false)
    }

    pub fn set_power(&mut self, on: bool) -> Result<(), Error> {
        self.command(if on { opcode::DISPLAY_ON } else { opcode::DISPLAY_OFF })
    }

    pub fn reset_power(&mut self) -> Result<(), Error> {
        self.set_power(false)
    }

    /// most panels stay dark unless the charge pump is enabled before power on
    pub fn set_charge_pump(&mut self, enable: bool) -> Result<(), Error> {
        self.commands(&[opcode::SET_CHARGE_PUMP, 0x10 | if enable { 0x04 } else { 0x00 }])
    }

    pub fn reset_charge_pump(&mut self) -> Result<(), Error> {
        self.set_charge_pump(false)
    }

    // scrolling

    /// configure continuous horizontal scrolling of the pages `start_page..=end_page`
    pub fn setup_horizontal_scroll(
        &mut self,
        direction: ScrollDirection,
        start_page: u8,
        end_page: u8,
        interval_frames: u16,
    ) -> Result<(), Error> {
        check_page_range("horizontal scroll pages", start_page, end_page)?;
        let interval = ScrollInterval::from_frames(interval_frames)?;
        let op = match direction {
            ScrollDirection::Right => opcode::HORIZONTAL_SCROLL_RIGHT,
            ScrollDirection::Left => opcode::HORIZONTAL_SCROLL_LEFT,
        };
        self.commands(&[op, 0x00, start_page, interval.code(), end_page, 0x00, 0xff])
    }

    /// configure horizontal scrolling combined with a vertical offset per step,
    /// the controller has no vertical-only scroll
    pub fn setup_scroll(
        &mut self,
        direction: ScrollDirection,
        start_page: u8,
        end_page: u8,
        interval_frames: u16,
        vertical_offset: u8,
    ) -> Result<(), Error> {
        check_page_range("diagonal scroll pages", start_page, end_page)?;
        if vertical_offset > MAX_ROW {
            Err(invalid("vertical scroll offset", vertical_offset, "an offset up to 63 rows"))?
        }
        let interval = ScrollInterval::from_frames(interval_frames)?;
        let op = match direction {
            ScrollDirection::Right => opcode::DIAGONAL_SCROLL_RIGHT,
            ScrollDirection::Left => opcode::DIAGONAL_SCROLL_LEFT,
        };
        self.commands(&[op, 0x00, start_page, interval.code(), end_page, vertical_offset])
    }

    /// start or stop scrolling, ram contents have to be rewritten after stopping
    pub fn set_scroll(&mut self, enable: bool) -> Result<(), Error> {
        self.command(if enable { opcode::SCROLL_ON } else { opcode::SCROLL_OFF })
    }

    /// Split the rows into a fixed top area of `fixed_rows` and a scrolling area of
    /// `scrolling_rows`, whatever is left over stays fixed at the bottom.
    ///
    /// The controller silently ignores combinations exceeding the mux ratio.
    pub fn set_vertical_scroll_area(&mut self, fixed_rows: u8, scrolling_rows: u8) -> Result<(), Error> {
        if fixed_rows > MAX_ROW {
            Err(invalid("fixed scroll rows", fixed_rows, "up to 63 rows"))?
        }
        if scrolling_rows > 0x7f {
            Err(invalid("scrolling rows", scrolling_rows, "up to 127 rows"))?
        }
        self.commands(&[opcode::SET_VERTICAL_SCROLL_AREA, fixed_rows, scrolling_rows])
    }

    pub fn reset_vertical_scroll_area(&mut self) -> Result<(), Error> {
        self.set_vertical_scroll_area(DEFAULT_SCROLL_AREA.0, DEFAULT_SCROLL_AREA.1)
    }

    // addressing

    /// Set the column pointer for page addressing mode.
    ///
    /// The column is split into a low and a high nibble command.
    pub fn set_column_start(&mut self, column: u8) -> Result<(), Error> {
        if column > MAX_COLUMN {
            Err(invalid("column start", column, "a column up to 127"))?
        }
        self.command(opcode::SET_LOW_COLUMN | (column & 0x0f))?;
        self.command(opcode::SET_HIGH_COLUMN | ((column >> 4) & 0x0f))
    }

    pub fn reset_column_start(&mut self) -> Result<(), Error> {
        self.set_column_start(0)
    }

    pub fn set_mem_addressing_mode(&mut self, mode: AddressingMode) -> Result<(), Error> {
        self.commands(&[opcode::SET_MEMORY_MODE, mode as u8])
    }

    pub fn reset_mem_addressing_mode(&mut self) -> Result<(), Error> {
        self.set_mem_addressing_mode(AddressingMode::Page)
    }

    /// column window for horizontal and vertical addressing mode
    pub fn set_column_address(&mut self, start: u8, end: u8) -> Result<(), Error> {
        if start > end || end > MAX_COLUMN {
            Err(invalid("column address", if start > end { start } else { end }, "start <= end <= 127"))?
        }
        self.commands(&[opcode::SET_COLUMN_ADDRESS, start, end])
    }

    pub fn reset_column_address(&mut self) -> Result<(), Error> {
        self.set_column_address(0, MAX_COLUMN)
    }

    /// page window for horizontal and vertical addressing mode
    pub fn set_page_address(&mut self, start: u8, end: u8) -> Result<(), Error> {
        check_page_range("page address", start, end)?;
        self.commands(&[opcode::SET_PAGE_ADDRESS, start, end])
    }

    pub fn reset_page_address(&mut self) -> Result<(), Error> {
        self.set_page_address(0, MAX_PAGE)
    }

    /// page pointer for page addressing mode
    pub fn set_page_start(&mut self, page: u8) -> Result<(), Error> {
        if page > MAX_PAGE {
            Err(invalid("page start", page, "a page up to 7"))?
        }
        self.command(opcode::SET_PAGE_START | page)
    }

    // hardware configuration

    pub fn set_start_line(&mut self, line: u8) -> Result<(), Error> {
        if line > MAX_ROW {
            Err(invalid("start line", line, "a line up to 63"))?
        }
        self.command(opcode::SET_START_LINE | line)
    }

    pub fn reset_start_line(&mut self) -> Result<(), Error> {
        self.set_start_line(0)
    }

    /// normal maps column 0 to segment 0, reversed maps column 127 to segment 0
    pub fn set_segment_remap(&mut self, reverse: bool) -> Result<(), Error> {
        self.command(if reverse { opcode::SEGMENT_REMAP_REVERSE } else { opcode::SEGMENT_REMAP_NORMAL })
    }

    pub fn reset_segment_remap(&mut self) -> Result<(), Error> {
        self.set_segment_remap(false)
    }

    /// number of driven rows, has to match the panel height
    pub fn set_mux_ratio(&mut self, ratio: u8) -> Result<(), Error> {
        if !(1..=DEFAULT_MUX_RATIO).contains(&ratio) {
            Err(invalid("mux ratio", ratio, "1 to 64 rows"))?
        }
        self.commands(&[opcode::SET_MUX_RATIO, (ratio - 1) & 0x3f])
    }

    pub fn reset_mux_ratio(&mut self) -> Result<(), Error> {
        self.set_mux_ratio(DEFAULT_MUX_RATIO)
    }

    /// normal scans from COM0, reversed scans from COM[mux ratio - 1]
    pub fn set_com_scan(&mut self, reverse: bool) -> Result<(), Error> {
        self.command(if reverse { opcode::COM_SCAN_REVERSE } else { opcode::COM_SCAN_NORMAL })
    }

    pub fn reset_com_scan(&mut self) -> Result<(), Error> {
        self.set_com_scan(false)
    }

    pub fn set_display_offset(&mut self, offset: u8) -> Result<(), Error> {
        if offset > MAX_ROW {
            Err(invalid("display offset", offset, "an offset up to 63 rows"))?
        }
        self.commands(&[opcode::SET_DISPLAY_OFFSET, offset])
    }

    pub fn reset_display_offset(&mut self) -> Result<(), Error> {
        self.set_display_offset(0)
    }

    /// COM pin wiring of the panel, depends entirely on the module
    pub fn set_com_pin_config(&mut self, alternate: bool, remap: bool) -> Result<(), Error> {
        let config = 0x02 | if alternate { 0x10 } else { 0x00 } | if remap { 0x20 } else { 0x00 };
        self.commands(&[opcode::SET_COM_PINS, config])
    }

    pub fn reset_com_pin_config(&mut self) -> Result<(), Error> {
        self.set_com_pin_config(true, false)
    }

    // timing

    pub fn set_clock(&mut self, divide_ratio: u8, oscillator: u8) -> Result<(), Error> {
        if !(1..=16).contains(&divide_ratio) {
            Err(invalid("clock divide ratio", divide_ratio, "1 to 16"))?
        }
        if oscillator > 0x0f {
            Err(invalid("oscillator frequency", oscillator, "0 to 15"))?
        }
        self.commands(&[opcode::SET_CLOCK_DIV, (oscillator << 4) | (divide_ratio - 1)])
    }

    pub fn reset_clock(&mut self) -> Result<(), Error> {
        self.set_clock(DEFAULT_CLOCK_DIVIDE, DEFAULT_OSCILLATOR)
    }

    /// length of both pre-charge phases in display clocks
    pub fn set_precharge(&mut self, phase1: u8, phase2: u8) -> Result<(), Error> {
        if !(1..=15).contains(&phase1) {
            Err(invalid("pre-charge phase 1", phase1, "1 to 15 clocks"))?
        }
        if !(1..=15).contains(&phase2) {
            Err(invalid("pre-charge phase 2", phase2, "1 to 15 clocks"))?
        }
        self.commands(&[opcode::SET_PRECHARGE, (phase2 << 4) | phase1])
    }

    pub fn reset_precharge(&mut self) -> Result<(), Error> {
        self.set_precharge(DEFAULT_PRECHARGE.0, DEFAULT_PRECHARGE.1)
    }

    pub fn set_vcomh_level(&mut self, code: u8) -> Result<(), Error> {
        let level = VcomhLevel::new(code)?;
        self.commands(&[opcode::SET_VCOMH_DESELECT, level.code() << 4])
    }

    pub fn reset_vcomh_level(&mut self) -> Result<(), Error> {
        self.set_vcomh_level(VcomhLevel::MV_770.code())
    }

    // effects

    /// Fade out or blink the whole display, `interval_frames` is rounded down to a multiple of
    /// 8 and values below 8 are raised to 8.
    pub fn set_fade(&mut self, mode: FadeMode, interval_frames: u8) -> Result<(), Error> {
        if interval_frames > 128 {
            Err(invalid("fade interval", interval_frames, "up to 128 frames"))?
        }
        let steps = (interval_frames.max(8) / 8 - 1) & 0x0f;
        self.commands(&[opcode::SET_FADE, mode as u8 | steps])
    }

    pub fn reset_fade(&mut self) -> Result<(), Error> {
        self.set_fade(FadeMode::Off, DEFAULT_FADE_INTERVAL)
    }

    /// doubles every row, only works with the alternate COM pin configuration
    pub fn set_zoom(&mut self, enable: bool) -> Result<(), Error> {
        self.commands(&[opcode::SET_ZOOM, u8::from(enable)])
    }

    pub fn reset_zoom(&mut self) -> Result<(), Error> {
        self.set_zoom(false)
    }

    /// read the status register, many modules do not wire up reads in serial mode
    pub fn read_status(&mut self) -> Result<Status, Error> {
        Ok(Status::from_bits_truncate(self.bus.read_byte()?))
    }

    // sequences

    /// run `steps` in order, stopping at the first failure without undoing earlier steps
    fn run_sequence(&mut self, name: &str, steps: &[Step<'_, B>]) -> Result<(), Error> {
        for (index, (step, run)) in steps.iter().enumerate() {
            if let Err(err) = run(&mut *self) {
                log::error!("{name} failed at step {} of {} ({step}): {err}", index + 1, steps.len());
                return Err(err);
            }
        }
        log::debug!("{name} completed {} steps", steps.len());
        Ok(())
    }

    /// Bring every register back to its datasheet default.
    ///
    /// Stops at the first failing command and leaves the controller in whatever state the
    /// commands sent so far produced, recovery means running the whole reset again.
    pub fn soft_reset(&mut self) -> Result<(), Error> {
        let steps: [Step<'_, B>; 23] = [
            ("flush pending command", &|driver: &mut Self| (0..FLUSH_NOPS).try_for_each(|_| driver.nop())),
            ("power", &Self::reset_power),
            ("charge pump", &Self::reset_charge_pump),
            ("contrast", &Self::reset_contrast),
            ("display test", &Self::reset_display_test),
            ("inverse", &Self::reset_inverse),
            ("vertical scroll area", &Self::reset_vertical_scroll_area),
            ("scroll", &|driver: &mut Self| driver.set_scroll(false)),
            ("column start", &Self::reset_column_start),
            ("addressing mode", &Self::reset_mem_addressing_mode),
            ("column address", &Self::reset_column_address),
            ("page address", &Self::reset_page_address),
            ("start line", &Self::reset_start_line),
            ("segment remap", &Self::reset_segment_remap),
            ("mux ratio", &Self::reset_mux_ratio),
            ("com scan", &Self::reset_com_scan),
            ("display offset", &Self::reset_display_offset),
            ("com pins", &Self::reset_com_pin_config),
            ("clock", &Self::reset_clock),
            ("pre-charge", &Self::reset_precharge),
            ("vcomh level", &Self::reset_vcomh_level),
            ("fade", &Self::reset_fade),
            ("zoom", &Self::reset_zoom),
        ];
        self.run_sequence("soft reset", &steps)
    }

    /// Reset the controller and configure it for a `columns` x `rows` panel, then switch it on.
    ///
    /// The display must not be used for frames if this fails.
    pub fn init(&mut self, columns: u32, rows: u32) -> Result<(), Error> {
        let geometry = Geometry::new(columns, rows)?;
        self.soft_reset()?;

        let mux_ratio = geometry.height() as u8;
        let steps: [Step<'_, B>; 7] = [
            ("power off", &Self::reset_power),
            ("mux ratio", &move |driver: &mut Self| driver.set_mux_ratio(mux_ratio)),
            ("addressing mode", &|driver: &mut Self| driver.set_mem_addressing_mode(AddressingMode::Horizontal)),
            ("segment remap", &|driver: &mut Self| driver.set_segment_remap(true)),
            ("com scan", &|driver: &mut Self| driver.set_com_scan(true)),
            ("charge pump", &|driver: &mut Self| driver.set_charge_pump(true)),
            ("power on", &|driver: &mut Self| driver.set_power(true)),
        ];
        self.run_sequence("init", &steps)
    }

    /// blank the display ram, its contents survive power cycles on many modules
    pub fn clear(&mut self, columns: u32, rows: u32) -> Result<(), Error> {
        let geometry = Geometry::new(columns, rows)?;
        self.write_frame(&PackedBitmap::blank(geometry))
    }

    /// send a packed frame as a single data transfer
    pub fn write_frame(&mut self, bitmap: &PackedBitmap) -> Result<(), Error> {
        self.bus.write(bitmap.as_bytes())
    }

    /// send raw display data, the caller has to put the data control byte in front
    pub fn write_data(&mut self, data: &[u8]) -> Result<(), Error> {
        match data.first() {
            Some(&CONTROL_DATA) => self.bus.write(data),
            Some(other) => Err(invalid("data control byte", *other, "0x40")),
            None => Err(invalid("data length", 0, "at least the control byte")),
        }
    }
}

fn check_page_range(register: &'static str, start: u8, end: u8) -> Result<(), Error> {
    if start > MAX_PAGE || end > MAX_PAGE {
        Err(invalid(register, start.max(end), "pages up to 7"))?
    }
    if start > end {
        Err(invalid(register, start, "a start page not after the end page"))?
    }
    Ok(())
}
