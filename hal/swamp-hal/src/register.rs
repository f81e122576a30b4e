//! Register map and register file access
//!
//! Addresses are ATmega2560 data-space addresses (I/O registers offset by
//! 0x20), which is what a volatile pointer dereference needs on the target.

/// CPU clock of the controller board
pub const CPU_HZ: u32 = 16_000_000;

/// 8-bit registers used by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    // Digital ports
    Pina,
    Ddra,
    Porta,
    Pinb,
    Ddrb,
    Portb,
    Pinc,
    Ddrc,
    Portc,

    // Timer/Counter1
    Tifr1,
    Timsk1,
    Tccr1a,
    Tccr1b,
    Tcnt1l,
    Tcnt1h,

    // Analog to digital converter
    Adcl,
    Adch,
    Adcsra,
    Adcsrb,
    Admux,

    // Two-wire interface
    Twbr,
    Twsr,
    Twdr,
    Twcr,

    // USART0
    Ucsr0a,
    Ucsr0b,
    Ucsr0c,
    Ubrr0l,
    Ubrr0h,
    Udr0,
}

impl Register {
    /// Data-space address of the register
    pub const fn address(self) -> u16 {
        match self {
            Register::Pina => 0x20,
            Register::Ddra => 0x21,
            Register::Porta => 0x22,
            Register::Pinb => 0x23,
            Register::Ddrb => 0x24,
            Register::Portb => 0x25,
            Register::Pinc => 0x26,
            Register::Ddrc => 0x27,
            Register::Portc => 0x28,
            Register::Tifr1 => 0x36,
            Register::Timsk1 => 0x6F,
            Register::Adcl => 0x78,
            Register::Adch => 0x79,
            Register::Adcsra => 0x7A,
            Register::Adcsrb => 0x7B,
            Register::Admux => 0x7C,
            Register::Tccr1a => 0x80,
            Register::Tccr1b => 0x81,
            Register::Tcnt1l => 0x84,
            Register::Tcnt1h => 0x85,
            Register::Twbr => 0xB8,
            Register::Twsr => 0xB9,
            Register::Twdr => 0xBB,
            Register::Twcr => 0xBC,
            Register::Ucsr0a => 0xC0,
            Register::Ucsr0b => 0xC1,
            Register::Ucsr0c => 0xC2,
            Register::Ubrr0l => 0xC4,
            Register::Ubrr0h => 0xC5,
            Register::Udr0 => 0xC6,
        }
    }
}

/// 16-bit registers accessed as a low/high byte pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register16 {
    /// Timer/Counter1 count
    Tcnt1,
    /// ADC conversion result
    Adc,
    /// USART0 baud rate
    Ubrr0,
}

impl Register16 {
    /// Low byte register
    pub const fn low(self) -> Register {
        match self {
            Register16::Tcnt1 => Register::Tcnt1l,
            Register16::Adc => Register::Adcl,
            Register16::Ubrr0 => Register::Ubrr0l,
        }
    }

    /// High byte register
    pub const fn high(self) -> Register {
        match self {
            Register16::Tcnt1 => Register::Tcnt1h,
            Register16::Adc => Register::Adch,
            Register16::Ubrr0 => Register::Ubrr0h,
        }
    }
}

/// Timer/Counter1 bits
pub mod tc1 {
    /// TCCR1A waveform generation bits WGM11:10
    pub const WGM_A_MASK: u8 = 0b0000_0011;
    /// TCCR1B waveform generation bits WGM13:12
    pub const WGM_B_MASK: u8 = 0b0001_1000;
    /// TCCR1B clock select CS12:10
    pub const CS_MASK: u8 = 0b0000_0111;
    /// Clock select: no prescaling
    pub const CS_DIV1: u8 = 0b0000_0001;
    /// TIFR1 / TIMSK1 overflow bit
    pub const TOV1: u8 = 1 << 0;
}

/// ADC bits
pub mod adc {
    /// ADCSRA: ADC enable
    pub const ADEN: u8 = 1 << 7;
    /// ADCSRA: start conversion, reads one while converting
    pub const ADSC: u8 = 1 << 6;
    /// ADCSRA: auto trigger (free running)
    pub const ADATE: u8 = 1 << 5;
    /// ADCSRA: conversion complete interrupt flag
    pub const ADIF: u8 = 1 << 4;
    /// ADCSRA: interrupt enable
    pub const ADIE: u8 = 1 << 3;
    /// ADCSRA: prescaler select ADPS2:0
    pub const ADPS_MASK: u8 = 0b0000_0111;
    /// Prescaler /128 (125 kHz ADC clock at 16 MHz)
    pub const ADPS_DIV128: u8 = 0b0000_0111;
    /// ADMUX: reference select REFS1:0
    pub const REFS_MASK: u8 = 0b1100_0000;
    /// Reference: AVcc with external capacitor at AREF
    pub const REFS_AVCC: u8 = 0b0100_0000;
    /// ADMUX: left adjust result
    pub const ADLAR: u8 = 1 << 5;
    /// ADMUX: channel select MUX4:0
    pub const MUX_MASK: u8 = 0b0001_1111;
    /// ADCSRB: high channel selector
    pub const MUX5: u8 = 1 << 3;
    /// ADCSRB: auto trigger source ADTS2:0
    pub const ADTS_MASK: u8 = 0b0000_0111;
    /// Conversion length in ADC clocks (single conversion)
    pub const CONVERSION_CLOCKS: u32 = 13;
    /// Prescaler division for [`ADPS_DIV128`]
    pub const PRESCALE: u32 = 128;
}

/// Two-wire interface bits
pub mod twi {
    /// TWCR: interrupt flag, write one to start the next bus action
    pub const TWINT: u8 = 1 << 7;
    /// TWCR: acknowledge received bytes
    pub const TWEA: u8 = 1 << 6;
    /// TWCR: generate START
    pub const TWSTA: u8 = 1 << 5;
    /// TWCR: generate STOP
    pub const TWSTO: u8 = 1 << 4;
    /// TWCR: enable the interface
    pub const TWEN: u8 = 1 << 2;
    /// TWSR: prescaler bits
    pub const TWPS_MASK: u8 = 0b0000_0011;
    /// TWSR: status bits
    pub const STATUS_MASK: u8 = 0b1111_1000;

    /// Status codes (master mode)
    pub mod status {
        pub const START: u8 = 0x08;
        pub const REP_START: u8 = 0x10;
        pub const SLA_W_ACK: u8 = 0x18;
        pub const SLA_W_NACK: u8 = 0x20;
        pub const DATA_W_ACK: u8 = 0x28;
        pub const DATA_W_NACK: u8 = 0x30;
        pub const ARB_LOST: u8 = 0x38;
        pub const SLA_R_ACK: u8 = 0x40;
        pub const SLA_R_NACK: u8 = 0x48;
        pub const DATA_R_ACK: u8 = 0x50;
        pub const DATA_R_NACK: u8 = 0x58;
    }
}

/// USART0 bits
pub mod usart {
    /// UCSR0A: data register empty
    pub const UDRE0: u8 = 1 << 5;
    /// UCSR0A: double speed
    pub const U2X0: u8 = 1 << 1;
    /// UCSR0B: transmitter enable
    pub const TXEN0: u8 = 1 << 3;
    /// UCSR0C: mode, parity, stop bits and character size
    pub const FRAME_MASK: u8 = 0b1111_1110;
    /// UCSR0C: asynchronous, no parity, one stop bit, 8 data bits
    pub const FRAME_8N1: u8 = 0b0000_0110;
}

/// Byte-wide access to the controller's registers
///
/// Implementors provide raw `read`/`write`; everything else is built on top
/// of them. Methods take `&self` because hardware registers are shared by
/// every driver on the board; implementations use volatile access or
/// interior mutability.
///
/// Shared port registers must only be changed through [`modify`],
/// [`set_bits`], [`clear_bits`] or [`write_field`]. A plain [`write`] to a
/// port register clobbers sibling lines.
///
/// [`modify`]: RegisterFile::modify
/// [`set_bits`]: RegisterFile::set_bits
/// [`clear_bits`]: RegisterFile::clear_bits
/// [`write_field`]: RegisterFile::write_field
/// [`write`]: RegisterFile::write
pub trait RegisterFile {
    /// Read the current register value
    fn read(&self, reg: Register) -> u8;

    /// Write a full byte to the register
    fn write(&self, reg: Register, value: u8);

    /// Read-modify-write the register
    fn modify<F: FnOnce(u8) -> u8>(&self, reg: Register, f: F) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Set the bits in `mask`, leaving all others unchanged
    fn set_bits(&self, reg: Register, mask: u8) {
        self.modify(reg, |v| v | mask);
    }

    /// Clear the bits in `mask`, leaving all others unchanged
    fn clear_bits(&self, reg: Register, mask: u8) {
        self.modify(reg, |v| v & !mask);
    }

    /// Replace the bits in `mask` with the matching bits of `value`
    fn write_field(&self, reg: Register, mask: u8, value: u8) {
        self.modify(reg, |v| (v & !mask) | (value & mask));
    }

    /// Check whether any bit in `mask` is set
    fn is_set(&self, reg: Register, mask: u8) -> bool {
        self.read(reg) & mask != 0
    }

    /// Clear write-one-to-clear status flags
    ///
    /// Writes exactly `mask`: status flags are cleared by writing one, and
    /// a read-modify-write would also clear any other flag that happens to
    /// be pending.
    fn clear_flags(&self, reg: Register, mask: u8) {
        self.write(reg, mask);
    }

    /// Read a 16-bit register (low byte first, latching the high byte)
    fn read16(&self, reg: Register16) -> u16 {
        let low = self.read(reg.low()) as u16;
        let high = self.read(reg.high()) as u16;
        (high << 8) | low
    }

    /// Write a 16-bit register (high byte first, committed by the low byte)
    fn write16(&self, reg: Register16, value: u16) {
        self.write(reg.high(), (value >> 8) as u8);
        self.write(reg.low(), value as u8);
    }
}

impl<T: RegisterFile + ?Sized> RegisterFile for &T {
    fn read(&self, reg: Register) -> u8 {
        (**self).read(reg)
    }

    fn write(&self, reg: Register, value: u8) {
        (**self).write(reg, value)
    }
}
