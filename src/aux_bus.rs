//! Auxiliary I2C master
//!
//! The sensor can poll up to four secondary I2C devices (typically the
//! on-package magnetometer) and stage their data in EXT_SENS_DATA. A slave
//! is a plain [`AuxSlave`] handle naming a slot; the slot state lives in
//! the driver and every operation goes through an [`AuxBus`] handle
//! borrowed from it, which holds the exclusive bus lock for as long as it
//! lives.

use bilge::prelude::u4;
use embedded_hal::delay::DelayNs;

use crate::{
    interface::{BusType, Device},
    ll,
    registers::{
        I2cMstCtrl, I2cMstDelayCtrl, I2cSlvCtrl, EXT_SENS_DATA_00, I2C_SLV0_ADDR, I2C_SLV0_DO,
        I2C_SLV4_CTRL, READ_FLAG,
    },
    Error,
};

/// Slots usable for periodic reads. SLV4 works differently and is only used
/// for the master sample rate divider.
pub const AUX_SLAVE_COUNT: u8 = 4;

/// Bytes of EXT_SENS_DATA shared by all periodic slots
pub const MAX_EXT_SENS_DATA: u8 = 24;

/// Largest transfer a slot can be programmed for
pub const MAX_SLAVE_TRANSFER: u8 = 15;

/// Wait after kicking off a one-shot transfer
pub const PASSTHROUGH_SETTLE_MS: u32 = 10;

const I2C_MST_CLOCK_400KHZ: u8 = 13;

/// Master divider: with a 1 kHz sample rate slaves are polled at 100 Hz
const I2C_MST_SAMPLE_DIVIDER: u8 = 9;

/// Auxiliary bus bookkeeping kept next to the transport
#[derive(Debug, Default, Clone)]
pub(crate) struct AuxState {
    configured: bool,
    ext_sens_data: u8,
    next_instance: u8,
    /// `(offset, size)` in EXT_SENS_DATA per slot once periodic reads are
    /// set up
    windows: [Option<(u8, u8)>; AUX_SLAVE_COUNT as usize],
}

impl AuxState {
    fn window(&self, slave: &AuxSlave) -> Option<(u8, u8)> {
        self.windows[usize::from(slave.instance)]
    }
}

/// One secondary I2C device
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AuxSlave {
    address: u8,
    instance: u8,
}

impl AuxSlave {
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn instance(&self) -> u8 {
        self.instance
    }

    fn addr_reg(&self) -> u8 {
        I2C_SLV0_ADDR + self.instance * 3
    }

    fn reg_reg(&self) -> u8 {
        self.addr_reg() + 1
    }

    fn ctrl_reg(&self) -> u8 {
        self.addr_reg() + 2
    }

    fn do_reg(&self) -> u8 {
        I2C_SLV0_DO + self.instance
    }
}

/// Exclusive access to the auxiliary I2C master
///
/// Unlocks the bus when dropped.
pub struct AuxBus<'a, DEV: Device> {
    ll: &'a mut ll::MPU9250<DEV>,
}

impl<DEV: Device> Drop for AuxBus<'_, DEV> {
    fn drop(&mut self) {
        self.ll.dev.unlock();
    }
}

impl<'a, DEV: Device> AuxBus<'a, DEV> {
    pub(crate) fn acquire(ll: &'a mut ll::MPU9250<DEV>) -> Result<Self, Error<DEV::Error>> {
        if ll.dev.bus_type() == BusType::I2c {
            return Err(Error::NoAuxiliaryBus);
        }
        if !ll.dev.try_lock() {
            return Err(Error::BusBusy);
        }
        Ok(AuxBus { ll })
    }

    pub fn is_periodic(&self, slave: &AuxSlave) -> bool {
        self.ll.aux.window(slave).is_some()
    }

    /// Bytes staged per periodic read, zero before configuration
    pub fn sample_size(&self, slave: &AuxSlave) -> u8 {
        self.ll.aux.window(slave).map_or(0, |(_, size)| size)
    }

    fn data_reg(&self, slave: &AuxSlave) -> u8 {
        EXT_SENS_DATA_00 + self.ll.aux.window(slave).map_or(0, |(offset, _)| offset)
    }

    /// Allocate the next free slot for the device at `address`
    ///
    /// The first call also enables and configures the I2C master.
    pub fn request_slave(&mut self, address: u8) -> Result<AuxSlave, Error<DEV::Error>> {
        let instance = self.ll.aux.next_instance;
        if instance >= AUX_SLAVE_COUNT {
            return Err(Error::AuxNoFreeSlot);
        }
        if !self.ll.aux.configured {
            self.configure_master()?;
        }
        self.ll.aux.next_instance += 1;
        debug!("aux slave 0x{:x} on slot {}", address, instance);
        Ok(AuxSlave { address, instance })
    }

    fn configure_master(&mut self) -> Result<(), DEV::Error> {
        let mut user_ctrl = self.ll.user_ctrl();
        if !user_ctrl.i2c_mst_en() {
            user_ctrl.set_i2c_mst_en(true);
            self.ll.write_user_ctrl(user_ctrl)?;
        }

        // stop between reads, 400 kHz
        let mut mst = I2cMstCtrl::from(0);
        mst.set_clock(u4::new(I2C_MST_CLOCK_400KHZ));
        mst.set_p_nsr(true);
        self.ll.i2c_mst_ctrl().write(mst)?;

        self.ll
            .write_register(I2C_SLV4_CTRL, I2C_MST_SAMPLE_DIVIDER, false)?;

        let mut delay = I2cMstDelayCtrl::from(0);
        delay.set_slv0_dly_en(true);
        delay.set_slv1_dly_en(true);
        delay.set_slv2_dly_en(true);
        delay.set_slv3_dly_en(true);
        self.ll.i2c_mst_delay_ctrl().write(delay)?;

        self.ll.aux.configured = true;
        Ok(())
    }

    /// Have the master read `size` bytes from `reg` of `slave` on every
    /// sample
    ///
    /// Fails without touching the chip if the window does not fit in
    /// EXT_SENS_DATA.
    pub fn configure_periodic_read(
        &mut self,
        slave: &AuxSlave,
        reg: u8,
        size: u8,
    ) -> Result<(), Error<DEV::Error>> {
        if size == 0 || size > MAX_SLAVE_TRANSFER {
            return Err(Error::InvalidLength);
        }
        if self.is_periodic(slave) {
            return Err(Error::AuxSlaveBusy);
        }
        let offset = self.ll.aux.ext_sens_data;
        if offset + size > MAX_EXT_SENS_DATA {
            return Err(Error::AuxCapacityExceeded);
        }

        self.program_slot(slave, reg, size, None)?;
        self.ll.aux.windows[usize::from(slave.instance)] = Some((offset, size));
        self.ll.aux.ext_sens_data = offset + size;
        Ok(())
    }

    /// One-shot read of `buf.len()` bytes starting at `reg`
    pub fn passthrough_read(
        &mut self,
        slave: &AuxSlave,
        reg: u8,
        buf: &mut [u8],
        delay: &mut impl DelayNs,
    ) -> Result<usize, Error<DEV::Error>> {
        if self.is_periodic(slave) {
            error!("aux slave 0x{:x} is polled, no passthrough", slave.address);
            return Err(Error::AuxSlaveBusy);
        }
        if buf.is_empty() || buf.len() > usize::from(MAX_SLAVE_TRANSFER) {
            return Err(Error::InvalidLength);
        }

        self.program_slot(slave, reg, buf.len() as u8, None)?;
        delay.delay_ms(PASSTHROUGH_SETTLE_MS);
        let data = self.data_reg(slave);
        self.ll.read_registers(data, buf)?;
        self.ll.write_register(slave.ctrl_reg(), 0, false)?;
        Ok(buf.len())
    }

    /// One-shot write of `value` to `reg`
    pub fn passthrough_write(
        &mut self,
        slave: &AuxSlave,
        reg: u8,
        value: u8,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<DEV::Error>> {
        if self.is_periodic(slave) {
            error!("aux slave 0x{:x} is polled, no passthrough", slave.address);
            return Err(Error::AuxSlaveBusy);
        }

        self.program_slot(slave, reg, 1, Some(value))?;
        delay.delay_ms(PASSTHROUGH_SETTLE_MS);
        self.ll.write_register(slave.ctrl_reg(), 0, false)?;
        Ok(())
    }

    /// Latest data staged by a periodic read
    pub fn read(&mut self, slave: &AuxSlave, buf: &mut [u8]) -> Result<usize, Error<DEV::Error>> {
        let Some((offset, size)) = self.ll.aux.window(slave) else {
            error!("aux slave 0x{:x} read before configuration", slave.address);
            return Err(Error::AuxSlaveNotConfigured);
        };
        let size = usize::from(size);
        if buf.len() < size {
            return Err(Error::InvalidLength);
        }
        self.ll
            .read_registers(EXT_SENS_DATA_00 + offset, &mut buf[..size])?;
        Ok(size)
    }

    /// Disable the slot, program target and length, enable again
    ///
    /// `write` selects a single-byte write through the slot's DO register,
    /// otherwise the slot reads.
    fn program_slot(
        &mut self,
        slave: &AuxSlave,
        reg: u8,
        size: u8,
        write: Option<u8>,
    ) -> Result<(), DEV::Error> {
        self.ll.write_register(slave.ctrl_reg(), 0, false)?;

        let address = match write {
            Some(value) => {
                self.ll.write_register(slave.do_reg(), value, false)?;
                slave.address
            }
            None => slave.address | READ_FLAG,
        };
        self.ll.write_register(slave.addr_reg(), address, false)?;
        self.ll.write_register(slave.reg_reg(), reg, false)?;

        let mut ctrl = I2cSlvCtrl::from(0);
        ctrl.set_length(u4::new(size));
        ctrl.set_enable(true);
        self.ll
            .write_register(slave.ctrl_reg(), u8::from(ctrl), false)
    }
}
