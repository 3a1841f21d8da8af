//! Transport abstraction
//!
//! The driver talks to the sensor through [`Device`], which covers what the
//! sampling pipeline needs from a register-addressed bus: block reads, single
//! register writes, a transport specific FIFO burst read, bus clock
//! switching, exclusive access and the checked register facility.

pub mod checked;
pub mod i2c;
pub mod spi;

pub use checked::CheckedRegisters;
pub use i2c::{I2cInterface, I2C_ADDRESS, I2C_ADDRESS_ALT};
pub use spi::SpiInterface;

/// Which physical bus a [`Device`] runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusType {
    I2c,
    Spi,
}

/// Bus clock selection
///
/// Multi-step configuration runs at `Low`, FIFO streaming at `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusSpeed {
    Low,
    High,
}

/// Hook for switching the real bus clock
///
/// `embedded-hal` has no notion of clock speed, so the board support code
/// provides one. Any `FnMut(BusSpeed)` closure works.
pub trait SpeedControl {
    fn set_speed(&mut self, speed: BusSpeed);
}

/// Leaves the bus clock alone
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeedControl;

impl SpeedControl for NoSpeedControl {
    fn set_speed(&mut self, _speed: BusSpeed) {}
}

impl<F> SpeedControl for F
where
    F: FnMut(BusSpeed),
{
    fn set_speed(&mut self, speed: BusSpeed) {
        self(speed)
    }
}

/// Register level access to the sensor
pub trait Device {
    type Error: core::fmt::Debug;

    fn bus_type(&self) -> BusType;

    /// Read `buf.len()` consecutive registers starting at `reg`
    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write one register without touching the checked register table
    fn write_raw(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;

    /// Burst read from the FIFO data port
    fn read_fifo(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.read_registers(reg, buf)
    }

    fn set_speed(&mut self, speed: BusSpeed);

    fn checked_registers(&mut self) -> &mut CheckedRegisters;

    /// Non-blocking attempt at exclusive bus access
    ///
    /// Transports owned by value are always exclusive.
    fn try_lock(&mut self) -> bool {
        true
    }

    fn unlock(&mut self) {}

    fn write_register(&mut self, reg: u8, value: u8, checked: bool) -> Result<(), Self::Error> {
        self.write_raw(reg, value)?;
        if checked {
            self.checked_registers().set(reg, value);
        }
        Ok(())
    }

    /// Verify the next checked register
    ///
    /// Only every n-th call does a bus read. A register that no longer holds
    /// its expected value is rewritten and `false` is returned.
    fn check_next_register(&mut self) -> bool {
        let Some((reg, expected)) = self.checked_registers().next_due() else {
            return true;
        };
        let mut actual = [0u8; 1];
        if self.read_registers(reg, &mut actual).is_err() {
            return false;
        }
        if actual[0] == expected {
            return true;
        }
        warn!(
            "checked register 0x{:x} is 0x{:x}, expected 0x{:x}",
            reg, actual[0], expected
        );
        let _ = self.write_raw(reg, expected);
        false
    }
}
