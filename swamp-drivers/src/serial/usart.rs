//! USART0 transmitter
//!
//! Asynchronous 8N1 output at a fixed baud rate, blocking on the data
//! register empty flag. Used for the motor event log, one CRLF-terminated
//! line per event.

use core::convert::Infallible;

use swamp_core::traits::LogSink;
use swamp_hal::register::usart;
use swamp_hal::{Register, Register16, RegisterFile, CPU_HZ};

/// Baud rate divisor for normal-speed mode, rounded to nearest
pub const fn ubrr_for(baud: u32) -> u16 {
    let baud = if baud == 0 { 1 } else { baud as u64 };
    let divisor = (CPU_HZ as u64 + 8 * baud) / (16 * baud);
    let value = divisor.saturating_sub(1);
    if value > 0x0FFF {
        0x0FFF
    } else {
        value as u16
    }
}

/// USART0 in transmit-only mode
pub struct Usart0<R> {
    regs: R,
}

impl<R: RegisterFile> Usart0<R> {
    /// Configure 8N1 at `baud` and enable the transmitter
    pub fn new(regs: R, baud: u32) -> Self {
        regs.write16(Register16::Ubrr0, ubrr_for(baud));
        regs.clear_bits(Register::Ucsr0a, usart::U2X0);
        regs.write_field(Register::Ucsr0c, usart::FRAME_MASK, usart::FRAME_8N1);
        regs.set_bits(Register::Ucsr0b, usart::TXEN0);

        Self { regs }
    }

    /// Send one byte once the data register is free
    pub fn write_byte(&mut self, byte: u8) {
        while !self.regs.is_set(Register::Ucsr0a, usart::UDRE0) {}
        self.regs.write(Register::Udr0, byte);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }
}

impl<R: RegisterFile> embedded_io::ErrorType for Usart0<R> {
    type Error = Infallible;
}

impl<R: RegisterFile> embedded_io::Write for Usart0<R> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        while !self.regs.is_set(Register::Ucsr0a, usart::UDRE0) {}
        Ok(())
    }
}

impl<R: RegisterFile> core::fmt::Write for Usart0<R> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

impl<R: RegisterFile> LogSink for Usart0<R> {
    fn log_line(&mut self, line: &str) {
        self.write_bytes(line.as_bytes());
        self.write_bytes(b"\r\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write as _;
    use swamp_hal::sim::SimRegisters;

    #[test]
    fn test_divisor() {
        assert_eq!(ubrr_for(9600), 103);
        assert_eq!(ubrr_for(57_600), 16);
        assert_eq!(ubrr_for(115_200), 8);
        assert_eq!(ubrr_for(0), 0x0FFF);
    }

    #[test]
    fn test_divisor_for_huge_baud() {
        assert_eq!(ubrr_for(u32::MAX), 0);
        assert_eq!(ubrr_for(1_000_000), 0);
    }

    #[test]
    fn test_configuration() {
        let sim = SimRegisters::new();
        sim.poke(Register::Ucsr0c, 0xFF);
        let _uart = Usart0::new(&sim, 9600);

        assert_eq!(sim.peek(Register::Ubrr0l), 103);
        assert_eq!(sim.peek(Register::Ubrr0h), 0);
        assert_eq!(sim.peek(Register::Ucsr0c), usart::FRAME_8N1 | 0x01);
        assert_ne!(sim.peek(Register::Ucsr0b) & usart::TXEN0, 0);
    }

    #[test]
    fn test_log_lines_end_with_crlf() {
        let sim = SimRegisters::new();
        let mut uart = Usart0::new(&sim, 9600);

        uart.log_line("motor turned on");
        write!(uart, "{}", 42).unwrap();
        embedded_io::Write::write_all(&mut uart, b"!").unwrap();

        assert_eq!(sim.serial_text(), "motor turned on\r\n42!");
    }
}
