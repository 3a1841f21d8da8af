use crate::{
    aux_bus::AuxState,
    interface::{BusSpeed, Device},
    registers::{self, FifoEn, Interrupts, Register, UserCtrl},
    temperature::TemperatureSource,
};

/// Low level driver
///
/// Owns the transport and the USER_CTRL shadow. Every path that changes
/// USER_CTRL goes through [`MPU9250::write_user_ctrl`] so the shadow always
/// matches the last value written.
pub struct MPU9250<DEV> {
    pub(crate) dev: DEV,
    user_ctrl: UserCtrl,
    pub(crate) aux: AuxState,
}

impl<DEV> MPU9250<DEV> {
    pub fn new(dev: DEV) -> Self {
        MPU9250 {
            dev,
            user_ctrl: UserCtrl::from(0),
            aux: AuxState::default(),
        }
    }

    /// Last value written to, or loaded from, USER_CTRL
    pub fn user_ctrl(&self) -> UserCtrl {
        self.user_ctrl
    }

    pub fn device(&mut self) -> &mut DEV {
        &mut self.dev
    }

    /// Release the transport
    pub fn release(self) -> DEV {
        self.dev
    }
}

impl<DEV: Device> MPU9250<DEV> {
    pub fn read_register(&mut self, reg: u8) -> Result<u8, DEV::Error> {
        let mut value = [0u8; 1];
        self.dev.read_registers(reg, &mut value)?;
        Ok(value[0])
    }

    pub fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), DEV::Error> {
        self.dev.read_registers(reg, buf)
    }

    pub fn write_register(&mut self, reg: u8, value: u8, checked: bool) -> Result<(), DEV::Error> {
        self.dev.write_register(reg, value, checked)
    }

    pub fn who_am_i(&mut self) -> Result<u8, DEV::Error> {
        self.read_register(registers::WHOAMI)
    }

    /// Refresh the shadow from the chip
    pub fn load_user_ctrl(&mut self) -> Result<UserCtrl, DEV::Error> {
        self.user_ctrl = UserCtrl::from(self.read_register(UserCtrl::ADDR)?);
        Ok(self.user_ctrl)
    }

    pub fn write_user_ctrl(&mut self, value: UserCtrl) -> Result<(), DEV::Error> {
        self.write_register(UserCtrl::ADDR, u8::from(value), false)?;
        self.user_ctrl = value;
        Ok(())
    }

    /// Flush the hardware FIFO and re-enable streaming
    ///
    /// Runs at low bus speed and always restores high speed. Calling it
    /// repeatedly leaves the chip in the same state.
    pub fn fifo_reset(&mut self) -> Result<(), DEV::Error> {
        self.dev.set_speed(BusSpeed::Low);
        let result = self.fifo_reset_sequence();
        self.dev.set_speed(BusSpeed::High);
        result
    }

    fn fifo_reset_sequence(&mut self) -> Result<(), DEV::Error> {
        self.fifo_en().write(FifoEn::from(0))?;

        let mut base = self.user_ctrl;
        base.set_fifo_reset(false);
        base.set_fifo_en(false);
        self.write_user_ctrl(base)?;

        let mut pulse = base;
        pulse.set_fifo_reset(true);
        self.write_register(UserCtrl::ADDR, u8::from(pulse), false)?;

        let mut enabled = base;
        enabled.set_fifo_en(true);
        self.write_user_ctrl(enabled)?;

        self.fifo_en().write_checked(FifoEn::streaming())
    }

    /// Bytes waiting in the hardware FIFO
    pub fn read_fifo_count(&mut self) -> Result<u16, DEV::Error> {
        let mut count = [0u8; 2];
        self.dev.read_registers(registers::FIFO_COUNTH, &mut count)?;
        Ok(u16::from_be_bytes(count))
    }

    /// Burst read `buf.len()` bytes from the FIFO data port
    pub fn read_fifo(&mut self, buf: &mut [u8]) -> Result<(), DEV::Error> {
        self.dev.read_fifo(registers::FIFO_R_W, buf)
    }

    pub fn int_status(&mut self) -> Result<Interrupts, DEV::Error> {
        self.read_register(registers::INT_STATUS).map(Interrupts::from)
    }

    /// New sensor data has been latched
    pub fn data_ready(&mut self) -> Result<bool, DEV::Error> {
        Ok(self.int_status()?.raw_rdy())
    }

    /// Current TEMP_OUT value
    pub fn raw_temperature(&mut self) -> Result<i16, DEV::Error> {
        let mut raw = [0u8; 2];
        self.dev.read_registers(registers::TEMP_OUT_H, &mut raw)?;
        Ok(i16::from_be_bytes(raw))
    }
}

impl<DEV: Device> TemperatureSource for MPU9250<DEV> {
    fn read_raw_temperature(&mut self) -> Option<i16> {
        self.raw_temperature().ok()
    }
}
