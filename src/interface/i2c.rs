use embedded_hal::i2c::I2c;

use super::{BusSpeed, BusType, CheckedRegisters, Device, NoSpeedControl, SpeedControl};

/// I2C address with AD0 low
pub const I2C_ADDRESS: u8 = 0x68;
/// I2C address with AD0 high
pub const I2C_ADDRESS_ALT: u8 = 0x69;

/// I2C transport
///
/// The FIFO is drained with ordinary windowed burst reads. The auxiliary
/// I2C master is unavailable on this transport.
pub struct I2cInterface<I2C, S = NoSpeedControl> {
    i2c: I2C,
    address: u8,
    speed: S,
    checked: CheckedRegisters,
}

impl<I2C> I2cInterface<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, I2C_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self::with_speed_control(i2c, address, NoSpeedControl)
    }
}

impl<I2C, S> I2cInterface<I2C, S> {
    pub fn with_speed_control(i2c: I2C, address: u8, speed: S) -> Self {
        I2cInterface {
            i2c,
            address,
            speed,
            checked: CheckedRegisters::new(),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Release the I2C bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, S> Device for I2cInterface<I2C, S>
where
    I2C: I2c,
    S: SpeedControl,
{
    type Error = I2C::Error;

    fn bus_type(&self) -> BusType {
        BusType::I2c
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address, &[reg], buf)
    }

    fn write_raw(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[reg, value])
    }

    fn set_speed(&mut self, speed: BusSpeed) {
        self.speed.set_speed(speed);
    }

    fn checked_registers(&mut self) -> &mut CheckedRegisters {
        &mut self.checked
    }
}
