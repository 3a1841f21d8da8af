use embedded_hal::spi::{Operation, SpiDevice};

use super::{BusSpeed, BusType, CheckedRegisters, Device, NoSpeedControl, SpeedControl};
use crate::registers::READ_FLAG;

/// SPI transport
///
/// Register reads set [`READ_FLAG`] on the address byte. Chip select framing
/// is left to the `SpiDevice` implementation.
pub struct SpiInterface<SPI, S = NoSpeedControl> {
    spi: SPI,
    speed: S,
    checked: CheckedRegisters,
}

impl<SPI> SpiInterface<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self::with_speed_control(spi, NoSpeedControl)
    }
}

impl<SPI, S> SpiInterface<SPI, S> {
    pub fn with_speed_control(spi: SPI, speed: S) -> Self {
        SpiInterface {
            spi,
            speed,
            checked: CheckedRegisters::new(),
        }
    }

    /// Release the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI, S> Device for SpiInterface<SPI, S>
where
    SPI: SpiDevice,
    S: SpeedControl,
{
    type Error = SPI::Error;

    fn bus_type(&self) -> BusType {
        BusType::Spi
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.spi
            .transaction(&mut [Operation::Write(&[reg | READ_FLAG]), Operation::Read(buf)])
    }

    fn write_raw(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.spi.write(&[reg & !READ_FLAG, value])
    }

    /// Command byte followed by a zero-filled transfer, all under one chip
    /// select. Keeps the data phase a plain in-place transfer for DMA.
    fn read_fifo(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        buf.fill(0);
        self.spi.transaction(&mut [
            Operation::Write(&[reg | READ_FLAG]),
            Operation::TransferInPlace(buf),
        ])
    }

    fn set_speed(&mut self, speed: BusSpeed) {
        self.speed.set_speed(speed);
    }

    fn checked_registers(&mut self) -> &mut CheckedRegisters {
        &mut self.checked
    }
}
