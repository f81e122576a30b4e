//! Two-wire interface (I2C) master
//!
//! Blocking, register-level master mode. Each bus action is started by
//! writing TWCR with TWINT set and is complete when the hardware raises
//! TWINT again; the status code in TWSR then says what happened. Waits are
//! bounded by [`SPIN_BUDGET`] polls so a wedged bus surfaces as
//! [`TwiError::Timeout`] instead of hanging the controller.
//!
//! TWCR is a command register owned by this driver, so it is written whole.

use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation, SevenBitAddress};
use swamp_hal::register::twi::{self, status};
use swamp_hal::{Register, RegisterFile, CPU_HZ};

/// Polls of TWINT before giving up on a bus action
pub const SPIN_BUDGET: u32 = 10_000;

/// Standard-mode bus clock
pub const STANDARD_HZ: u32 = 100_000;

/// TWI errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwiError {
    /// Unexpected status code
    Bus(u8),
    /// Target did not acknowledge
    NoAcknowledge(NoAcknowledgeSource),
    /// Another master won the bus
    ArbitrationLost,
    /// TWINT never rose
    Timeout,
}

impl i2c::Error for TwiError {
    fn kind(&self) -> ErrorKind {
        match self {
            TwiError::Bus(_) => ErrorKind::Bus,
            TwiError::NoAcknowledge(source) => ErrorKind::NoAcknowledge(*source),
            TwiError::ArbitrationLost => ErrorKind::ArbitrationLoss,
            TwiError::Timeout => ErrorKind::Other,
        }
    }
}

/// TWI master
pub struct Twi<R> {
    regs: R,
}

impl<R: RegisterFile> Twi<R> {
    /// Enable the interface at `bus_hz` (prescaler 1)
    pub fn new(regs: R, bus_hz: u32) -> Self {
        let divider = (CPU_HZ / bus_hz.max(1)).saturating_sub(16) / 2;
        regs.clear_bits(Register::Twsr, twi::TWPS_MASK);
        regs.write(Register::Twbr, divider.min(u8::MAX as u32) as u8);
        regs.write(Register::Twcr, twi::TWEN);

        Self { regs }
    }

    fn wait(&self) -> Result<u8, TwiError> {
        for _ in 0..SPIN_BUDGET {
            if self.regs.is_set(Register::Twcr, twi::TWINT) {
                return Ok(self.regs.read(Register::Twsr) & twi::STATUS_MASK);
            }
        }
        Err(TwiError::Timeout)
    }

    fn start(&self) -> Result<(), TwiError> {
        self.regs
            .write(Register::Twcr, twi::TWINT | twi::TWSTA | twi::TWEN);
        match self.wait()? {
            status::START | status::REP_START => Ok(()),
            status::ARB_LOST => Err(TwiError::ArbitrationLost),
            other => Err(TwiError::Bus(other)),
        }
    }

    fn address(&self, address: SevenBitAddress, read: bool) -> Result<(), TwiError> {
        self.regs
            .write(Register::Twdr, (address << 1) | read as u8);
        self.regs.write(Register::Twcr, twi::TWINT | twi::TWEN);
        match self.wait()? {
            status::SLA_W_ACK | status::SLA_R_ACK => Ok(()),
            status::SLA_W_NACK | status::SLA_R_NACK => {
                Err(TwiError::NoAcknowledge(NoAcknowledgeSource::Address))
            }
            status::ARB_LOST => Err(TwiError::ArbitrationLost),
            other => Err(TwiError::Bus(other)),
        }
    }

    fn write_byte(&self, byte: u8) -> Result<(), TwiError> {
        self.regs.write(Register::Twdr, byte);
        self.regs.write(Register::Twcr, twi::TWINT | twi::TWEN);
        match self.wait()? {
            status::DATA_W_ACK => Ok(()),
            status::DATA_W_NACK => Err(TwiError::NoAcknowledge(NoAcknowledgeSource::Data)),
            status::ARB_LOST => Err(TwiError::ArbitrationLost),
            other => Err(TwiError::Bus(other)),
        }
    }

    fn read_byte(&self, ack: bool) -> Result<u8, TwiError> {
        let ea = if ack { twi::TWEA } else { 0 };
        self.regs
            .write(Register::Twcr, twi::TWINT | twi::TWEN | ea);
        match (self.wait()?, ack) {
            (status::DATA_R_ACK, true) | (status::DATA_R_NACK, false) => {
                Ok(self.regs.read(Register::Twdr))
            }
            (status::ARB_LOST, _) => Err(TwiError::ArbitrationLost),
            (other, _) => Err(TwiError::Bus(other)),
        }
    }

    fn stop(&self) {
        self.regs
            .write(Register::Twcr, twi::TWINT | twi::TWSTO | twi::TWEN);
        for _ in 0..SPIN_BUDGET {
            if !self.regs.is_set(Register::Twcr, twi::TWSTO) {
                break;
            }
        }
    }

    fn run(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), TwiError> {
        let mut previous_read = None;

        for i in 0..operations.len() {
            let is_read = matches!(operations[i], Operation::Read(_));
            let next_is_read = matches!(operations.get(i + 1), Some(Operation::Read(_)));

            // New (repeated) START whenever the direction changes
            if previous_read != Some(is_read) {
                self.start()?;
                self.address(address, is_read)?;
            }
            previous_read = Some(is_read);

            match &mut operations[i] {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        self.write_byte(byte)?;
                    }
                }
                Operation::Read(buffer) => {
                    let len = buffer.len();
                    for (j, slot) in buffer.iter_mut().enumerate() {
                        // NACK only the final byte of the final read
                        let last = j + 1 == len && !next_is_read;
                        *slot = self.read_byte(!last)?;
                    }
                }
            }
        }

        Ok(())
    }
}

impl<R: RegisterFile> i2c::ErrorType for Twi<R> {
    type Error = TwiError;
}

impl<R: RegisterFile> i2c::I2c<SevenBitAddress> for Twi<R> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }

        let result = self.run(address, operations);
        self.stop();
        if let Err(e) = result {
            log_warn!("twi transaction with {} failed: {:?}", address, e);
        }
        result
    }
}
