//! Digital lines
//!
//! Every logical line of the controller (LEDs, motor, button, LCD control
//! and data, DHT11 data) is one bit of one port. All writes go through the
//! masked helpers of [`RegisterFile`], so changing one line never touches
//! the other bits of the same port.

use crate::register::{Register, RegisterFile};

/// Digital output pin
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Toggle the pin state
    fn toggle(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Digital input pin
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// 8-bit GPIO port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
}

impl Port {
    /// Input register (pin levels)
    pub const fn pin(self) -> Register {
        match self {
            Port::A => Register::Pina,
            Port::B => Register::Pinb,
            Port::C => Register::Pinc,
        }
    }

    /// Data direction register (1 = output)
    pub const fn ddr(self) -> Register {
        match self {
            Port::A => Register::Ddra,
            Port::B => Register::Ddrb,
            Port::C => Register::Ddrc,
        }
    }

    /// Output register (levels, or pull-ups for inputs)
    pub const fn port(self) -> Register {
        match self {
            Port::A => Register::Porta,
            Port::B => Register::Portb,
            Port::C => Register::Portc,
        }
    }
}

/// One bit of one port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortBit {
    pub port: Port,
    pub bit: u8,
}

impl PortBit {
    pub const fn new(port: Port, bit: u8) -> Self {
        Self { port, bit }
    }

    /// Single-bit mask within the port
    pub const fn mask(self) -> u8 {
        1 << (self.bit & 0x07)
    }
}

/// Four consecutive bits of one port carrying a nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NibbleBus {
    pub port: Port,
    /// Bit position of the least significant data line (0..=4)
    pub offset: u8,
}

impl NibbleBus {
    pub const fn new(port: Port, offset: u8) -> Self {
        Self { port, offset }
    }

    /// Mask covering the four data lines
    pub const fn mask(self) -> u8 {
        0x0F << self.offset
    }
}

/// Logical lines of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    LedYellow,
    LedGreen,
    LedBlue,
    LedRed,
    Motor,
    /// Push button, active low with pull-up
    Button,
    LcdEnable,
    LcdRegisterSelect,
    /// DHT11 single-wire data
    TemperatureData,
}

/// Board wiring: logical line to port bit
///
/// Porting to other wiring keeps the logical lines and changes only this
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineMap {
    pub led_yellow: PortBit,
    pub led_green: PortBit,
    pub led_blue: PortBit,
    pub led_red: PortBit,
    pub motor: PortBit,
    pub button: PortBit,
    pub lcd_enable: PortBit,
    pub lcd_register_select: PortBit,
    pub lcd_data: NibbleBus,
    pub temperature_data: PortBit,
    /// ADC channel of the water level probe
    pub water_channel: u8,
}

impl LineMap {
    /// Arduino Mega 2560 wiring
    ///
    /// | Line | Port/bit | Board pin |
    /// |---|---|---|
    /// | button | PA0 | 22 |
    /// | LED red/blue/green/yellow | PA4..PA7 | 26..29 |
    /// | motor | PB0 | 53 |
    /// | DHT11 data | PB6 | 12 |
    /// | LCD RS / E | PC0 / PC1 | 37 / 36 |
    /// | LCD D4..D7 | PC4..PC7 | 33..30 |
    /// | water probe | ADC0 | A0 |
    pub const MEGA2560: Self = Self {
        led_yellow: PortBit::new(Port::A, 7),
        led_green: PortBit::new(Port::A, 6),
        led_blue: PortBit::new(Port::A, 5),
        led_red: PortBit::new(Port::A, 4),
        motor: PortBit::new(Port::B, 0),
        button: PortBit::new(Port::A, 0),
        lcd_enable: PortBit::new(Port::C, 1),
        lcd_register_select: PortBit::new(Port::C, 0),
        lcd_data: NibbleBus::new(Port::C, 4),
        temperature_data: PortBit::new(Port::B, 6),
        water_channel: 0,
    };

    /// Port bit of a logical line
    pub const fn bit(&self, line: Line) -> PortBit {
        match line {
            Line::LedYellow => self.led_yellow,
            Line::LedGreen => self.led_green,
            Line::LedBlue => self.led_blue,
            Line::LedRed => self.led_red,
            Line::Motor => self.motor,
            Line::Button => self.button,
            Line::LcdEnable => self.lcd_enable,
            Line::LcdRegisterSelect => self.lcd_register_select,
            Line::TemperatureData => self.temperature_data,
        }
    }
}

impl Default for LineMap {
    fn default() -> Self {
        Self::MEGA2560
    }
}

/// Masked digital I/O over a register file
#[derive(Debug, Clone, Copy)]
pub struct DigitalIo<R> {
    regs: R,
    map: LineMap,
}

impl<R: RegisterFile> DigitalIo<R> {
    pub fn new(regs: R, map: LineMap) -> Self {
        Self { regs, map }
    }

    /// Board wiring in use
    pub fn map(&self) -> &LineMap {
        &self.map
    }

    /// Underlying register file
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Drive a line high
    pub fn set(&self, line: Line) {
        set_bit(&self.regs, self.map.bit(line));
    }

    /// Drive a line low
    pub fn clear(&self, line: Line) {
        clear_bit(&self.regs, self.map.bit(line));
    }

    /// Drive a line to the given level
    pub fn write(&self, line: Line, high: bool) {
        if high {
            self.set(line);
        } else {
            self.clear(line);
        }
    }

    /// Sample the input level of a line
    pub fn read(&self, line: Line) -> bool {
        read_bit(&self.regs, self.map.bit(line))
    }

    /// Level currently driven on an output line
    pub fn is_set_high(&self, line: Line) -> bool {
        let bit = self.map.bit(line);
        self.regs.is_set(bit.port.port(), bit.mask())
    }

    /// Place the low four bits of `value` on `port` starting at `offset`
    ///
    /// Bits outside the nibble keep their state.
    pub fn write_nibble(&self, port: Port, value: u8, offset: u8) {
        debug_assert!(offset <= 4, "nibble does not fit in the port");
        self.regs
            .write_field(port.port(), 0x0F << offset, (value & 0x0F) << offset);
    }

    /// Place a nibble on a data bus
    pub fn write_bus(&self, bus: NibbleBus, value: u8) {
        self.write_nibble(bus.port, value, bus.offset);
    }

    /// Make a line an output (level unchanged)
    pub fn make_output(&self, line: Line) {
        make_output(&self.regs, self.map.bit(line));
    }

    /// Make a line an input, optionally with the internal pull-up
    pub fn make_input(&self, line: Line, pull_up: bool) {
        make_input(&self.regs, self.map.bit(line), pull_up);
    }

    /// Make all four lines of a bus outputs
    pub fn make_bus_output(&self, bus: NibbleBus) {
        self.regs.set_bits(bus.port.ddr(), bus.mask());
    }
}

impl<R: RegisterFile + Copy> DigitalIo<R> {
    /// Owned handle for a single line
    pub fn pin(&self, line: Line) -> Pin<R> {
        Pin::new(self.regs, self.map.bit(line))
    }
}

/// Single line handle
#[derive(Debug, Clone, Copy)]
pub struct Pin<R> {
    regs: R,
    bit: PortBit,
}

impl<R: RegisterFile> Pin<R> {
    pub fn new(regs: R, bit: PortBit) -> Self {
        Self { regs, bit }
    }

    /// Port bit this handle drives
    pub fn port_bit(&self) -> PortBit {
        self.bit
    }

    /// Make the line an output (level unchanged)
    pub fn make_output(&mut self) {
        make_output(&self.regs, self.bit);
    }

    /// Make the line an input, optionally with the internal pull-up
    pub fn make_input(&mut self, pull_up: bool) {
        make_input(&self.regs, self.bit, pull_up);
    }
}

impl<R: RegisterFile> OutputPin for Pin<R> {
    fn set_high(&mut self) {
        set_bit(&self.regs, self.bit);
    }

    fn set_low(&mut self) {
        clear_bit(&self.regs, self.bit);
    }

    fn toggle(&mut self) {
        let mask = self.bit.mask();
        self.regs.modify(self.bit.port.port(), |v| v ^ mask);
    }

    fn is_set_high(&self) -> bool {
        self.regs.is_set(self.bit.port.port(), self.bit.mask())
    }
}

impl<R: RegisterFile> InputPin for Pin<R> {
    fn is_high(&self) -> bool {
        read_bit(&self.regs, self.bit)
    }
}

fn set_bit<R: RegisterFile>(regs: &R, bit: PortBit) {
    regs.set_bits(bit.port.port(), bit.mask());
}

fn clear_bit<R: RegisterFile>(regs: &R, bit: PortBit) {
    regs.clear_bits(bit.port.port(), bit.mask());
}

fn read_bit<R: RegisterFile>(regs: &R, bit: PortBit) -> bool {
    regs.is_set(bit.port.pin(), bit.mask())
}

fn make_output<R: RegisterFile>(regs: &R, bit: PortBit) {
    regs.set_bits(bit.port.ddr(), bit.mask());
}

fn make_input<R: RegisterFile>(regs: &R, bit: PortBit, pull_up: bool) {
    regs.clear_bits(bit.port.ddr(), bit.mask());
    if pull_up {
        regs.set_bits(bit.port.port(), bit.mask());
    } else {
        regs.clear_bits(bit.port.port(), bit.mask());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use proptest::prelude::*;

    struct Flat {
        bytes: [Cell<u8>; 0x200],
    }

    impl Flat {
        fn new() -> Self {
            Self {
                bytes: core::array::from_fn(|_| Cell::new(0)),
            }
        }
    }

    impl RegisterFile for Flat {
        fn read(&self, reg: Register) -> u8 {
            self.bytes[reg.address() as usize].get()
        }

        fn write(&self, reg: Register, value: u8) {
            self.bytes[reg.address() as usize].set(value);
        }
    }

    const LINES: [Line; 9] = [
        Line::LedYellow,
        Line::LedGreen,
        Line::LedBlue,
        Line::LedRed,
        Line::Motor,
        Line::Button,
        Line::LcdEnable,
        Line::LcdRegisterSelect,
        Line::TemperatureData,
    ];

    #[test]
    fn test_mega_map_has_no_collisions() {
        let map = LineMap::MEGA2560;
        for (i, a) in LINES.iter().enumerate() {
            for b in &LINES[i + 1..] {
                assert_ne!(map.bit(*a), map.bit(*b), "{:?} and {:?}", a, b);
            }
            let bit = map.bit(*a);
            if bit.port == map.lcd_data.port {
                assert_eq!(bit.mask() & map.lcd_data.mask(), 0, "{:?} on data bus", a);
            }
        }
    }

    #[test]
    fn test_set_and_clear_single_line() {
        let regs = Flat::new();
        let io = DigitalIo::new(&regs, LineMap::MEGA2560);

        io.set(Line::LedGreen);
        assert_eq!(regs.read(Register::Porta), 0b0100_0000);
        assert!(io.is_set_high(Line::LedGreen));

        io.set(Line::LedRed);
        io.clear(Line::LedGreen);
        assert_eq!(regs.read(Register::Porta), 0b0001_0000);
    }

    #[test]
    fn test_write_nibble_keeps_control_lines() {
        let regs = Flat::new();
        let io = DigitalIo::new(&regs, LineMap::MEGA2560);

        io.set(Line::LcdEnable);
        io.set(Line::LcdRegisterSelect);
        io.write_nibble(Port::C, 0xA, 4);
        assert_eq!(regs.read(Register::Portc), 0b1010_0011);

        io.write_bus(LineMap::MEGA2560.lcd_data, 0x5);
        assert_eq!(regs.read(Register::Portc), 0b0101_0011);
    }

    #[test]
    fn test_input_with_pull_up() {
        let regs = Flat::new();
        regs.write(Register::Ddra, 0xFF);
        let io = DigitalIo::new(&regs, LineMap::MEGA2560);

        io.make_input(Line::Button, true);
        assert_eq!(regs.read(Register::Ddra), 0xFE);
        assert_eq!(regs.read(Register::Porta), 0x01);
    }

    #[test]
    fn test_pin_handle() {
        let regs = Flat::new();
        let io = DigitalIo::new(&regs, LineMap::MEGA2560);
        let mut motor = io.pin(Line::Motor);

        motor.set_high();
        assert!(motor.is_set_high());
        motor.toggle();
        assert!(motor.is_set_low());

        regs.write(Register::Pina, 0x01);
        assert!(io.pin(Line::Button).is_high());
    }

    proptest! {
        #[test]
        fn prop_line_write_preserves_siblings(initial in any::<u8>(), idx in 0usize..9, high in any::<bool>()) {
            let regs = Flat::new();
            let io = DigitalIo::new(&regs, LineMap::MEGA2560);
            let line = LINES[idx];
            let bit = LineMap::MEGA2560.bit(line);
            regs.write(bit.port.port(), initial);

            io.write(line, high);
            let once = regs.read(bit.port.port());
            io.write(line, high);
            let twice = regs.read(bit.port.port());

            prop_assert_eq!(once, twice);
            prop_assert_eq!(once & !bit.mask(), initial & !bit.mask());
            prop_assert_eq!(once & bit.mask() != 0, high);
        }

        #[test]
        fn prop_nibble_write_preserves_siblings(initial in any::<u8>(), value in any::<u8>(), offset in 0u8..=4) {
            let regs = Flat::new();
            let io = DigitalIo::new(&regs, LineMap::MEGA2560);
            regs.write(Register::Portc, initial);

            io.write_nibble(Port::C, value, offset);
            let after = regs.read(Register::Portc);
            let mask = 0x0F << offset;

            prop_assert_eq!(after & !mask, initial & !mask);
            prop_assert_eq!((after & mask) >> offset, value & 0x0F);
        }
    }
}
