//! Simulated register file
//!
//! A host-side model of the registers the controller touches, good enough
//! to run the real drivers without hardware:
//!
//! - Time is counted in CPU cycles. Every register access costs a couple of
//!   cycles; starting Timer1 jumps straight to its overflow, and an ADC
//!   conversion takes its 13 ADC clocks.
//! - Status flags (TOV1, ADIF, TWINT) are cleared by writing one.
//! - Input pins honour DDR and pull-ups, and can be driven by levels that
//!   change at scheduled times.
//! - USART0 transmissions are captured; the TWI bus answers for attached
//!   register-pointer targets (DS1307 style).
//! - A DHT11-style single-wire sensor answers a start pulse on its line.
//! - Every write is traced with its cycle stamp for protocol assertions.

use core::cell::RefCell;
use std::string::String;
use std::vec::Vec;

use crate::gpio::{Port, PortBit};
use crate::register::{adc, tc1, twi, usart, Register};

/// Size of the modelled data space
const DATA_SPACE: usize = 0x200;

/// Cycles charged for each register access
const ACCESS_CYCLES: u64 = 2;

/// CPU cycles per microsecond
const CYCLES_PER_US: u64 = (crate::register::CPU_HZ / 1_000_000) as u64;

/// Size of an attached I2C target's register space
const TARGET_MEMORY: usize = 64;

/// Shortest host start pulse a single-wire sensor answers (18 ms)
const START_PULSE_CYCLES: u64 = 18_000 * CYCLES_PER_US;

/// A traced register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry {
    pub reg: Register,
    pub value: u8,
    pub cycle: u64,
}

#[derive(Debug, Clone, Copy)]
struct InputChange {
    bit: PortBit,
    at: u64,
    /// `None` leaves the line floating
    level: Option<bool>,
}

#[derive(Debug, Clone)]
struct I2cTarget {
    address: u8,
    memory: [u8; TARGET_MEMORY],
    pointer: usize,
}

#[derive(Debug, Clone, Copy)]
struct SingleWireSensor {
    bit: PortBit,
    frame: [u8; 5],
    /// Cycle at which the host started driving the line low
    low_since: Option<u64>,
    answers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TwiPhase {
    Idle,
    Started,
    Writing { target: usize, first: bool },
    Reading { target: usize },
    Nacked,
}

struct SimState {
    mem: [u8; DATA_SPACE],
    cycles: u64,
    trace: Vec<TraceEntry>,
    inputs: Vec<InputChange>,
    analog: [u16; 16],
    serial: Vec<u8>,
    targets: Vec<I2cTarget>,
    twi_phase: TwiPhase,
    sensor: Option<SingleWireSensor>,
}

/// Simulated register file
///
/// Implements [`RegisterFile`](crate::RegisterFile) for `&SimRegisters`, so
/// one instance can be shared by every driver under test.
pub struct SimRegisters {
    state: RefCell<SimState>,
}

impl Default for SimRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl SimRegisters {
    /// Create a register file with reset values
    pub fn new() -> Self {
        let mut mem = [0u8; DATA_SPACE];
        mem[Register::Ucsr0a.address() as usize] = usart::UDRE0;
        mem[Register::Ucsr0c.address() as usize] = usart::FRAME_8N1;

        Self {
            state: RefCell::new(SimState {
                mem,
                cycles: 0,
                trace: Vec::new(),
                inputs: Vec::new(),
                analog: [0; 16],
                serial: Vec::new(),
                targets: Vec::new(),
                twi_phase: TwiPhase::Idle,
                sensor: None,
            }),
        }
    }

    /// Elapsed CPU cycles
    pub fn cycles(&self) -> u64 {
        self.state.borrow().cycles
    }

    /// Elapsed time in microseconds
    pub fn elapsed_us(&self) -> u64 {
        self.cycles() / CYCLES_PER_US
    }

    /// Let time pass without any register access
    pub fn advance_us(&self, us: u64) {
        self.state.borrow_mut().cycles += us * CYCLES_PER_US;
    }

    /// Raw register value, without side effects or elapsed time
    pub fn peek(&self, reg: Register) -> u8 {
        let state = self.state.borrow();
        match reg {
            Register::Pina => state.pin_value(Port::A),
            Register::Pinb => state.pin_value(Port::B),
            Register::Pinc => state.pin_value(Port::C),
            _ => state.mem[reg.address() as usize],
        }
    }

    /// Set a raw register value, without side effects or tracing
    pub fn poke(&self, reg: Register, value: u8) {
        self.state.borrow_mut().mem[reg.address() as usize] = value;
    }

    /// Drive an input line to a level from now on
    pub fn drive_input(&self, bit: PortBit, high: bool) {
        self.schedule_input(bit, Some(high), 0);
    }

    /// Stop driving an input line (pull-up or floating low)
    pub fn release_input(&self, bit: PortBit) {
        self.schedule_input(bit, None, 0);
    }

    /// Change an input line `after_us` microseconds from now
    pub fn schedule_input(&self, bit: PortBit, level: Option<bool>, after_us: u64) {
        let mut state = self.state.borrow_mut();
        let at = state.cycles + after_us * CYCLES_PER_US;
        state.inputs.push(InputChange { bit, at, level });
    }

    /// Voltage seen by an ADC channel, as a 10-bit conversion result
    pub fn set_analog(&self, channel: u8, value: u16) {
        self.state.borrow_mut().analog[(channel & 0x0F) as usize] = value & 0x3FF;
    }

    /// Bytes transmitted on USART0 so far
    pub fn serial_output(&self) -> Vec<u8> {
        self.state.borrow().serial.clone()
    }

    /// Transmitted bytes as text (lossy)
    pub fn serial_text(&self) -> String {
        String::from_utf8_lossy(&self.state.borrow().serial).into_owned()
    }

    /// Forget captured serial output
    pub fn clear_serial(&self) {
        self.state.borrow_mut().serial.clear();
    }

    /// All traced writes
    pub fn trace(&self) -> Vec<TraceEntry> {
        self.state.borrow().trace.clone()
    }

    /// Traced writes to one register
    pub fn writes_to(&self, reg: Register) -> Vec<TraceEntry> {
        self.state
            .borrow()
            .trace
            .iter()
            .filter(|t| t.reg == reg)
            .copied()
            .collect()
    }

    /// Forget traced writes
    pub fn clear_trace(&self) {
        self.state.borrow_mut().trace.clear();
    }

    /// Attach a register-pointer I2C target (7-bit address)
    ///
    /// The first byte of every write sets the register pointer, further
    /// bytes are stored and reads stream from the pointer.
    pub fn attach_i2c_target(&self, address: u8, initial: &[u8]) {
        let mut memory = [0u8; TARGET_MEMORY];
        let len = initial.len().min(TARGET_MEMORY);
        memory[..len].copy_from_slice(&initial[..len]);

        self.state.borrow_mut().targets.push(I2cTarget {
            address,
            memory,
            pointer: 0,
        });
    }

    /// Attach a DHT11-style sensor that sends `frame` after each start pulse
    ///
    /// The host must hold the line low for at least 18 ms and then release
    /// it. The answer follows the DHT11 timing: 80 µs low, 80 µs high, then
    /// 40 bits of 50 µs low plus 27 µs (zero) or 70 µs (one) high.
    pub fn attach_single_wire_sensor(&self, bit: PortBit, frame: [u8; 5]) {
        self.state.borrow_mut().sensor = Some(SingleWireSensor {
            bit,
            frame,
            low_since: None,
            answers: 0,
        });
    }

    /// Change the frame the single-wire sensor sends next
    pub fn set_single_wire_frame(&self, frame: [u8; 5]) {
        if let Some(sensor) = self.state.borrow_mut().sensor.as_mut() {
            sensor.frame = frame;
        }
    }

    /// Number of start pulses the single-wire sensor has answered
    pub fn single_wire_answers(&self) -> usize {
        self.state.borrow().sensor.map(|s| s.answers).unwrap_or(0)
    }

    /// Register space of an attached I2C target
    pub fn i2c_memory(&self, address: u8) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .targets
            .iter()
            .find(|t| t.address == address)
            .map(|t| t.memory.to_vec())
    }
}

impl crate::register::RegisterFile for SimRegisters {
    fn read(&self, reg: Register) -> u8 {
        let mut state = self.state.borrow_mut();
        state.cycles += ACCESS_CYCLES;
        match reg {
            Register::Pina => state.pin_value(Port::A),
            Register::Pinb => state.pin_value(Port::B),
            Register::Pinc => state.pin_value(Port::C),
            _ => state.mem[reg.address() as usize],
        }
    }

    fn write(&self, reg: Register, value: u8) {
        let mut state = self.state.borrow_mut();
        state.cycles += ACCESS_CYCLES;
        let cycle = state.cycles;
        state.trace.push(TraceEntry { reg, value, cycle });

        match reg {
            Register::Tifr1 => {
                let addr = reg.address() as usize;
                state.mem[addr] &= !value;
            }
            Register::Tccr1b => state.write_tccr1b(value),
            Register::Adcsra => state.write_adcsra(value),
            Register::Ucsr0a => {
                let addr = reg.address() as usize;
                state.mem[addr] = (value & usart::U2X0) | usart::UDRE0;
            }
            Register::Udr0 => {
                if state.mem[Register::Ucsr0b.address() as usize] & usart::TXEN0 != 0 {
                    state.serial.push(value);
                }
            }
            Register::Twcr => state.write_twcr(value),
            Register::Twsr => {
                let addr = reg.address() as usize;
                state.mem[addr] = (state.mem[addr] & twi::STATUS_MASK) | (value & twi::TWPS_MASK);
            }
            // Input registers: writing one toggles the output latch on this
            // family, which no driver relies on
            Register::Pina | Register::Pinb | Register::Pinc => {}
            _ => state.mem[reg.address() as usize] = value,
        }

        state.watch_single_wire(reg);
    }
}

impl SimState {
    fn reg(&self, reg: Register) -> u8 {
        self.mem[reg.address() as usize]
    }

    fn set_reg(&mut self, reg: Register, value: u8) {
        self.mem[reg.address() as usize] = value;
    }

    fn input_level(&self, bit: PortBit) -> Option<bool> {
        self.inputs
            .iter()
            .filter(|c| c.bit == bit && c.at <= self.cycles)
            .max_by_key(|c| c.at)
            .and_then(|c| c.level)
    }

    fn pin_value(&self, port: Port) -> u8 {
        let ddr = self.reg(port.ddr());
        let latch = self.reg(port.port());

        (0..8u8).fold(0u8, |acc, bit| {
            let mask = 1 << bit;
            let high = if ddr & mask != 0 {
                latch & mask != 0
            } else {
                match self.input_level(PortBit::new(port, bit)) {
                    Some(level) => level,
                    // Pull-up enabled when the latch bit is set
                    None => latch & mask != 0,
                }
            };
            if high {
                acc | mask
            } else {
                acc
            }
        })
    }

    fn watch_single_wire(&mut self, reg: Register) {
        let Some(mut sensor) = self.sensor else {
            return;
        };
        let port = sensor.bit.port;
        if reg != port.ddr() && reg != port.port() {
            return;
        }

        let mask = sensor.bit.mask();
        let output = self.reg(port.ddr()) & mask != 0;
        let driven_low = output && self.reg(port.port()) & mask == 0;

        match (driven_low, sensor.low_since) {
            (true, None) => sensor.low_since = Some(self.cycles),
            (false, Some(since)) => {
                sensor.low_since = None;
                if !output && self.cycles - since >= START_PULSE_CYCLES {
                    sensor.answers += 1;
                    self.schedule_frame(sensor.bit, sensor.frame);
                }
            }
            _ => {}
        }

        self.sensor = Some(sensor);
    }

    fn schedule_frame(&mut self, bit: PortBit, frame: [u8; 5]) {
        let mut at = self.cycles + 30 * CYCLES_PER_US;
        let mut push = |inputs: &mut Vec<InputChange>, level: Option<bool>, after_us: u64| {
            inputs.push(InputChange { bit, at, level });
            at += after_us * CYCLES_PER_US;
        };

        push(&mut self.inputs, Some(false), 80);
        push(&mut self.inputs, Some(true), 80);
        for byte in frame {
            for i in (0..8).rev() {
                let high_us = if byte & (1 << i) != 0 { 70 } else { 27 };
                push(&mut self.inputs, Some(false), 50);
                push(&mut self.inputs, Some(true), high_us);
            }
        }
        push(&mut self.inputs, Some(false), 50);
        push(&mut self.inputs, None, 0);
    }

    fn write_tccr1b(&mut self, value: u8) {
        let was_running = self.reg(Register::Tccr1b) & tc1::CS_MASK != 0;
        self.set_reg(Register::Tccr1b, value);

        let prescale = match value & tc1::CS_MASK {
            1 => 1,
            2 => 8,
            3 => 64,
            4 => 256,
            5 => 1024,
            // Stopped, or clocked from the T1 pin which is not wired
            _ => return,
        };

        if was_running {
            return;
        }

        let count = ((self.reg(Register::Tcnt1h) as u64) << 8) | self.reg(Register::Tcnt1l) as u64;
        let ticks = 0x1_0000 - count;
        self.cycles += ticks * prescale;
        self.set_reg(Register::Tcnt1h, 0);
        self.set_reg(Register::Tcnt1l, 0);
        let flags = self.reg(Register::Tifr1) | tc1::TOV1;
        self.set_reg(Register::Tifr1, flags);
    }

    fn write_adcsra(&mut self, value: u8) {
        let old = self.reg(Register::Adcsra);
        // ADIF is cleared by writing one, kept otherwise
        let adif = if value & adc::ADIF != 0 { 0 } else { old & adc::ADIF };
        let mut new = (value & !adc::ADIF) | adif;

        if new & adc::ADSC != 0 && new & adc::ADEN != 0 {
            let admux = self.reg(Register::Admux);
            let high = self.reg(Register::Adcsrb) & adc::MUX5 != 0;
            // Only single-ended inputs are modelled (MUX4:3 clear)
            let result = if admux & 0b0001_1000 == 0 {
                let channel = (admux & 0x07) as usize + if high { 8 } else { 0 };
                self.analog[channel]
            } else {
                0
            };
            let result = if admux & adc::ADLAR != 0 {
                result << 6
            } else {
                result
            };
            self.set_reg(Register::Adcl, result as u8);
            self.set_reg(Register::Adch, (result >> 8) as u8);

            let prescale = match new & adc::ADPS_MASK {
                0 | 1 => 2,
                n => 1u64 << n,
            };
            self.cycles += adc::CONVERSION_CLOCKS as u64 * prescale;
            new = (new & !adc::ADSC) | adc::ADIF;
        }

        self.set_reg(Register::Adcsra, new);
    }

    fn write_twcr(&mut self, value: u8) {
        use twi::status;

        self.set_reg(Register::Twcr, value & !(twi::TWINT | twi::TWSTO | twi::TWSTA));

        if value & twi::TWEN == 0 {
            self.twi_phase = TwiPhase::Idle;
            return;
        }
        if value & twi::TWSTO != 0 {
            self.twi_phase = TwiPhase::Idle;
            return;
        }
        if value & twi::TWINT == 0 {
            return;
        }

        let code = if value & twi::TWSTA != 0 {
            let code = if self.twi_phase == TwiPhase::Idle {
                status::START
            } else {
                status::REP_START
            };
            self.twi_phase = TwiPhase::Started;
            code
        } else {
            let data = self.reg(Register::Twdr);
            match self.twi_phase {
                TwiPhase::Started => {
                    let address = data >> 1;
                    let read = data & 1 != 0;
                    match self.targets.iter().position(|t| t.address == address) {
                        Some(target) if read => {
                            self.twi_phase = TwiPhase::Reading { target };
                            status::SLA_R_ACK
                        }
                        Some(target) => {
                            self.twi_phase = TwiPhase::Writing {
                                target,
                                first: true,
                            };
                            status::SLA_W_ACK
                        }
                        None => {
                            self.twi_phase = TwiPhase::Nacked;
                            if read {
                                status::SLA_R_NACK
                            } else {
                                status::SLA_W_NACK
                            }
                        }
                    }
                }
                TwiPhase::Writing { target, first } => {
                    let t = &mut self.targets[target];
                    if first {
                        t.pointer = data as usize % TARGET_MEMORY;
                    } else {
                        t.memory[t.pointer] = data;
                        t.pointer = (t.pointer + 1) % TARGET_MEMORY;
                    }
                    self.twi_phase = TwiPhase::Writing {
                        target,
                        first: false,
                    };
                    status::DATA_W_ACK
                }
                TwiPhase::Reading { target } => {
                    let t = &mut self.targets[target];
                    let byte = t.memory[t.pointer];
                    t.pointer = (t.pointer + 1) % TARGET_MEMORY;
                    self.set_reg(Register::Twdr, byte);
                    if value & twi::TWEA != 0 {
                        status::DATA_R_ACK
                    } else {
                        status::DATA_R_NACK
                    }
                }
                TwiPhase::Nacked => status::DATA_W_NACK,
                // Bus error: data phase without START
                TwiPhase::Idle => 0x00,
            }
        };

        // Nine SCL periods per byte
        let twbr = self.reg(Register::Twbr) as u64;
        self.cycles += 9 * (16 + 2 * twbr);

        let prescaler = self.reg(Register::Twsr) & twi::TWPS_MASK;
        self.set_reg(Register::Twsr, code | prescaler);
        let twcr = self.reg(Register::Twcr) | twi::TWINT;
        self.set_reg(Register::Twcr, twcr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::{Register16, RegisterFile};

    #[test]
    fn test_timer_overflow_advances_time() {
        let sim = SimRegisters::new();
        let regs = &sim;

        regs.write16(Register16::Tcnt1, 0x1_0000u32.wrapping_sub(1600) as u16);
        let start = sim.cycles();
        regs.write_field(Register::Tccr1b, tc1::CS_MASK, tc1::CS_DIV1);

        assert!(regs.is_set(Register::Tifr1, tc1::TOV1));
        assert!(sim.cycles() - start >= 1600);

        regs.clear_flags(Register::Tifr1, tc1::TOV1);
        assert!(!regs.is_set(Register::Tifr1, tc1::TOV1));
    }

    #[test]
    fn test_flags_clear_only_when_written_one() {
        let sim = SimRegisters::new();
        // OCF1A pending beside TOV1
        let compare_a = 1 << 1;
        sim.poke(Register::Tifr1, tc1::TOV1 | compare_a);

        (&sim).clear_flags(Register::Tifr1, compare_a);
        assert_eq!(sim.peek(Register::Tifr1), tc1::TOV1);
    }

    #[test]
    fn test_adc_conversion() {
        let sim = SimRegisters::new();
        let regs = &sim;
        sim.set_analog(9, 700);

        regs.write(Register::Adcsra, adc::ADEN | adc::ADPS_DIV128);
        regs.write(Register::Admux, adc::REFS_AVCC | 0x01);
        regs.write(Register::Adcsrb, adc::MUX5);
        regs.set_bits(Register::Adcsra, adc::ADSC);

        assert!(!regs.is_set(Register::Adcsra, adc::ADSC));
        assert_eq!(regs.read16(Register16::Adc), 700);
    }

    #[test]
    fn test_pull_up_and_driven_input() {
        let sim = SimRegisters::new();
        let button = PortBit::new(Port::A, 0);
        sim.poke(Register::Porta, 0x01);

        assert_eq!(sim.peek(Register::Pina) & 0x01, 0x01);

        sim.drive_input(button, false);
        assert_eq!(sim.peek(Register::Pina) & 0x01, 0x00);

        sim.schedule_input(button, None, 10);
        assert_eq!(sim.peek(Register::Pina) & 0x01, 0x00);
        sim.advance_us(10);
        assert_eq!(sim.peek(Register::Pina) & 0x01, 0x01);
    }

    #[test]
    fn test_serial_capture_requires_transmitter() {
        let sim = SimRegisters::new();
        let regs = &sim;

        regs.write(Register::Udr0, b'x');
        regs.set_bits(Register::Ucsr0b, usart::TXEN0);
        regs.write(Register::Udr0, b'o');
        regs.write(Register::Udr0, b'k');

        assert_eq!(sim.serial_text(), "ok");
    }
}
