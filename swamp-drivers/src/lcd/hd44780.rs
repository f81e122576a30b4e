//! HD44780 driver, 4-bit bus
//!
//! Every byte goes out as two nibbles, high first. For each nibble the
//! driver sets RegisterSelect (low for commands, high for data), places the
//! nibble on D4..D7, pulses Enable high for at least [`ENABLE_PULSE_NS`] and
//! then waits [`SETTLE_US`] before the next nibble. The controller never
//! acknowledges anything, so there is nothing to report on failure.

use embedded_hal::delay::DelayNs;
use swamp_hal::{DigitalIo, Line, RegisterFile};

/// Instruction bytes
pub mod command {
    pub const CLEAR: u8 = 0x01;
    pub const HOME: u8 = 0x02;
    /// Entry mode: increment cursor, no display shift
    pub const ENTRY_INCREMENT: u8 = 0x06;
    /// Display on, cursor off, blink off
    pub const DISPLAY_ON: u8 = 0x0C;
    /// Function set: 4-bit bus, two lines, 5x8 font
    pub const FUNCTION_4BIT_2LINE: u8 = 0x28;
    /// Set DDRAM address (OR with the address)
    pub const SET_DDRAM: u8 = 0x80;
    /// Function set nibble used by the reset sequence (8-bit mode)
    pub const RESET_NIBBLE: u8 = 0x3;
    /// Function set nibble switching to 4-bit mode
    pub const FOUR_BIT_NIBBLE: u8 = 0x2;
}

/// Minimum Enable high time
pub const ENABLE_PULSE_NS: u32 = 1_000;

/// Wait after each nibble
pub const SETTLE_US: u32 = 100;

/// Extra wait after clear and home
pub const CLEAR_SETTLE_US: u32 = 2_000;

/// Wait after power-up before the first nibble
pub const POWER_ON_MS: u32 = 50;

/// DDRAM address of the first column of each row
pub const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

/// HD44780 on the board's LCD lines
pub struct Hd44780<R, D> {
    io: DigitalIo<R>,
    delay: D,
}

impl<R: RegisterFile, D: DelayNs> Hd44780<R, D> {
    /// Claim the LCD lines as outputs with Enable low
    ///
    /// Call [`init`](Self::init) before writing anything.
    pub fn new(io: DigitalIo<R>, delay: D) -> Self {
        let map = *io.map();
        io.clear(Line::LcdEnable);
        io.make_output(Line::LcdEnable);
        io.make_output(Line::LcdRegisterSelect);
        io.make_bus_output(map.lcd_data);

        Self { io, delay }
    }

    /// Reset into 4-bit, two-line mode with the display on and cleared
    pub fn init(&mut self) {
        self.delay.delay_ms(POWER_ON_MS);

        self.write_nibble(command::RESET_NIBBLE, false);
        self.delay.delay_us(4_500);
        self.write_nibble(command::RESET_NIBBLE, false);
        self.delay.delay_us(150);
        self.write_nibble(command::RESET_NIBBLE, false);
        self.delay.delay_us(150);
        self.write_nibble(command::FOUR_BIT_NIBBLE, false);

        self.command(command::FUNCTION_4BIT_2LINE);
        self.command(command::DISPLAY_ON);
        self.clear();
        self.command(command::ENTRY_INCREMENT);

        log_debug!("lcd ready");
    }

    /// Send an instruction byte
    pub fn command(&mut self, byte: u8) {
        self.send(byte, false);
    }

    /// Send a character byte
    pub fn write_data(&mut self, byte: u8) {
        self.send(byte, true);
    }

    /// Print text at the cursor; returns the number of characters sent
    pub fn print(&mut self, text: &str) -> usize {
        self.print_bytes(text.as_bytes())
    }

    /// Print raw bytes, stopping at the first NUL
    pub fn print_bytes(&mut self, text: &[u8]) -> usize {
        let mut sent = 0;
        for &byte in text.iter().take_while(|b| **b != 0) {
            self.write_data(byte);
            sent += 1;
        }
        sent
    }

    /// Clear the display and return the cursor home
    pub fn clear(&mut self) {
        self.command(command::CLEAR);
        self.delay.delay_us(CLEAR_SETTLE_US);
    }

    /// Return the cursor home
    pub fn home(&mut self) {
        self.command(command::HOME);
        self.delay.delay_us(CLEAR_SETTLE_US);
    }

    /// Move the cursor; rows beyond the last one wrap to row 0
    pub fn set_cursor(&mut self, col: u8, row: u8) {
        let offset = ROW_OFFSETS[row as usize % ROW_OFFSETS.len()];
        self.command(command::SET_DDRAM | (offset + (col & 0x3F)));
    }

    fn send(&mut self, byte: u8, data: bool) {
        self.write_nibble(byte >> 4, data);
        self.write_nibble(byte & 0x0F, data);
    }

    fn write_nibble(&mut self, nibble: u8, data: bool) {
        let bus = self.io.map().lcd_data;
        self.io.write(Line::LcdRegisterSelect, data);
        self.io.write_bus(bus, nibble);

        self.io.set(Line::LcdEnable);
        self.delay.delay_ns(ENABLE_PULSE_NS);
        self.io.clear(Line::LcdEnable);
        self.delay.delay_us(SETTLE_US);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::BusyDelay;
    use proptest::prelude::*;
    use swamp_hal::sim::SimRegisters;
    use swamp_hal::{LineMap, Register};

    const E: u8 = 1 << 1;
    const RS: u8 = 1 << 0;

    /// One Enable pulse seen on PORTC
    #[derive(Debug, PartialEq)]
    struct Pulse {
        data: bool,
        nibble: u8,
        width_cycles: u64,
    }

    fn pulses(sim: &SimRegisters) -> Vec<Pulse> {
        let mut out = Vec::new();
        let mut prev = 0u8;
        let mut rose: Option<(u64, u8)> = None;

        for write in sim.writes_to(Register::Portc) {
            if prev & E == 0 && write.value & E != 0 {
                rose = Some((write.cycle, write.value));
            }
            if prev & E != 0 && write.value & E == 0 {
                if let Some((start, value)) = rose.take() {
                    out.push(Pulse {
                        data: value & RS != 0,
                        nibble: value >> 4,
                        width_cycles: write.cycle - start,
                    });
                }
            }
            prev = write.value;
        }
        out
    }

    fn lcd(sim: &SimRegisters) -> Hd44780<&SimRegisters, BusyDelay<&SimRegisters>> {
        Hd44780::new(DigitalIo::new(sim, LineMap::MEGA2560), BusyDelay::new(sim))
    }

    #[test]
    fn test_init_sequence() {
        let sim = SimRegisters::new();
        let mut lcd = lcd(&sim);
        sim.clear_trace();

        lcd.init();

        let nibbles: Vec<(bool, u8)> = pulses(&sim).iter().map(|p| (p.data, p.nibble)).collect();
        assert_eq!(
            nibbles,
            [
                (false, 0x3),
                (false, 0x3),
                (false, 0x3),
                (false, 0x2),
                (false, 0x2),
                (false, 0x8),
                (false, 0x0),
                (false, 0xC),
                (false, 0x0),
                (false, 0x1),
                (false, 0x0),
                (false, 0x6),
            ]
        );
        assert!(sim.elapsed_us() >= (POWER_ON_MS * 1000) as u64);
    }

    #[test]
    fn test_print_pulses_each_nibble() {
        let sim = SimRegisters::new();
        let mut lcd = lcd(&sim);
        sim.clear_trace();

        assert_eq!(lcd.print("Hi"), 2);

        let seen = pulses(&sim);
        let nibbles: Vec<(bool, u8)> = seen.iter().map(|p| (p.data, p.nibble)).collect();
        assert_eq!(nibbles, [(true, 0x4), (true, 0x8), (true, 0x6), (true, 0x9)]);

        let min_cycles = (ENABLE_PULSE_NS as u64 * 16).div_ceil(1000);
        for pulse in &seen {
            assert!(pulse.width_cycles >= min_cycles, "{:?}", pulse);
        }
    }

    #[test]
    fn test_print_stops_at_nul() {
        let sim = SimRegisters::new();
        let mut lcd = lcd(&sim);
        sim.clear_trace();

        assert_eq!(lcd.print_bytes(b"ab\0cd"), 2);
        assert_eq!(pulses(&sim).len(), 4);
    }

    #[test]
    fn test_set_cursor_second_row() {
        let sim = SimRegisters::new();
        let mut lcd = lcd(&sim);
        sim.clear_trace();

        lcd.set_cursor(3, 1);

        let nibbles: Vec<(bool, u8)> = pulses(&sim).iter().map(|p| (p.data, p.nibble)).collect();
        assert_eq!(nibbles, [(false, 0xC), (false, 0x3)]);
    }

    #[test]
    fn test_clear_and_home_wait_for_the_controller() {
        let sim = SimRegisters::new();
        let mut lcd = lcd(&sim);
        sim.clear_trace();
        let start = sim.elapsed_us();

        lcd.clear();
        lcd.home();

        let nibbles: Vec<(bool, u8)> = pulses(&sim).iter().map(|p| (p.data, p.nibble)).collect();
        assert_eq!(nibbles, [(false, 0x0), (false, 0x1), (false, 0x0), (false, 0x2)]);
        assert!(sim.elapsed_us() - start >= 2 * CLEAR_SETTLE_US as u64);
    }

    #[test]
    fn test_keeps_other_port_bits() {
        let sim = SimRegisters::new();
        sim.poke(Register::Portc, 0b0000_0100);
        sim.poke(Register::Ddrc, 0b0000_1000);

        let mut lcd = lcd(&sim);
        lcd.init();
        lcd.print("ok");

        assert_eq!(sim.peek(Register::Portc) & 0b0000_1100, 0b0000_0100);
        assert_eq!(sim.peek(Register::Ddrc), 0b1111_1011);
        assert_eq!(sim.peek(Register::Portc) & E, 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_two_pulses_per_character(text in "[ -~]{0,16}") {
            let sim = SimRegisters::new();
            let mut lcd = lcd(&sim);
            sim.clear_trace();

            let sent = lcd.print(&text);
            let seen = pulses(&sim);

            prop_assert_eq!(sent, text.len());
            prop_assert_eq!(seen.len(), 2 * text.len());
            for (pulse, byte) in seen.chunks(2).zip(text.bytes()) {
                prop_assert_eq!(pulse[0].nibble, byte >> 4);
                prop_assert_eq!(pulse[1].nibble, byte & 0x0F);
            }
        }
    }
}
