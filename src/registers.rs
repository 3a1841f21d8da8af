//! Register map
//!
//! Addresses and bit layouts of the MPU-9250 registers touched by this
//! driver. Control registers that are read back or partially modified are
//! modelled as `bilge` bitfields; everything else is a plain address.
#![allow(clippy::identity_op)]

use core::marker::PhantomData;

use bilge::prelude::*;
use paste::paste;

use crate::interface::Device;

pub const SMPLRT_DIV: u8 = 0x19;
pub const CONFIG: u8 = 0x1A;
pub const GYRO_CONFIG: u8 = 0x1B;
pub const ACCEL_CONFIG: u8 = 0x1C;
pub const ACCEL_CONFIG2: u8 = 0x1D;
pub const FIFO_EN: u8 = 0x23;
pub const I2C_MST_CTRL: u8 = 0x24;
pub const I2C_SLV0_ADDR: u8 = 0x25;
pub const I2C_SLV4_CTRL: u8 = 0x34;
pub const INT_PIN_CFG: u8 = 0x37;
pub const INT_ENABLE: u8 = 0x38;
pub const INT_STATUS: u8 = 0x3A;
pub const TEMP_OUT_H: u8 = 0x41;
pub const EXT_SENS_DATA_00: u8 = 0x49;
pub const I2C_SLV0_DO: u8 = 0x63;
pub const I2C_MST_DELAY_CTRL: u8 = 0x67;
pub const USER_CTRL: u8 = 0x6A;
pub const PWR_MGMT_1: u8 = 0x6B;
pub const PWR_MGMT_2: u8 = 0x6C;
pub const FIFO_COUNTH: u8 = 0x72;
pub const FIFO_R_W: u8 = 0x74;
pub const WHOAMI: u8 = 0x75;

pub const WHOAMI_MPU9250: u8 = 0x71;
pub const WHOAMI_MPU9255: u8 = 0x73;

/// Set on the register address of an SPI read, and on an auxiliary slave
/// address to request a read instead of a write.
pub const READ_FLAG: u8 = 0x80;

/// Digital low pass filter presets for CONFIG.DLPF_CFG
#[bitsize(3)]
#[derive(Debug, Clone, Copy, PartialEq, FromBits)]
pub enum DlpfCfg {
    Hz256NoLpf2 = 0,
    Hz188 = 1,
    Hz98 = 2,
    Hz42 = 3,
    Hz20 = 4,
    Hz10 = 5,
    Hz5 = 6,
    Hz2100NoLpf = 7,
}

#[bitsize(2)]
#[derive(Debug, Clone, Copy, PartialEq, FromBits)]
pub enum GyroFullScale {
    Dps250 = 0,
    Dps500 = 1,
    Dps1000 = 2,
    Dps2000 = 3,
}

#[bitsize(2)]
#[derive(Debug, Clone, Copy, PartialEq, FromBits)]
pub enum AccelFullScale {
    G2 = 0,
    G4 = 1,
    G8 = 2,
    G16 = 3,
}

#[bitsize(3)]
#[derive(Debug, Clone, Copy, PartialEq, FromBits)]
pub enum ClockSource {
    Internal = 0,
    PllXGyro = 1,
    PllYGyro = 2,
    PllZGyro = 3,
    PllExt32k = 4,
    PllExt19M = 5,
    Reserved = 6,
    Stop = 7,
}

#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct Config {
    pub dlpf_cfg: DlpfCfg,
    pub ext_sync_set: u3,
    /// Stop writing to the FIFO when it is full instead of overwriting
    pub fifo_mode_stop: bool,
    reserved_7: u1,
}

#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct GyroConfig {
    pub fchoice_b: u2,
    reserved_2: u1,
    pub full_scale: GyroFullScale,
    pub z_self_test: bool,
    pub y_self_test: bool,
    pub x_self_test: bool,
}

#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct AccelConfig {
    reserved_0: u3,
    pub full_scale: AccelFullScale,
    pub z_self_test: bool,
    pub y_self_test: bool,
    pub x_self_test: bool,
}

#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct AccelConfig2 {
    pub a_dlpf_cfg: u3,
    /// Bypass the accel DLPF, giving the 4 kHz accel path
    pub fchoice_b: bool,
    reserved_4: u4,
}

#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct FifoEn {
    pub slv0: bool,
    pub slv1: bool,
    pub slv2: bool,
    pub accel: bool,
    pub gyro_z: bool,
    pub gyro_y: bool,
    pub gyro_x: bool,
    pub temp: bool,
}

impl FifoEn {
    /// Accel, the three gyro axes and temperature: the 14 byte record layout
    pub fn streaming() -> Self {
        let mut en = FifoEn::from(0);
        en.set_accel(true);
        en.set_gyro_x(true);
        en.set_gyro_y(true);
        en.set_gyro_z(true);
        en.set_temp(true);
        en
    }
}

#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct I2cMstCtrl {
    /// Master clock divider, 13 selects 400 kHz
    pub clock: u4,
    /// Issue a stop between reads instead of a restart
    pub p_nsr: bool,
    pub slv3_fifo_en: bool,
    pub wait_for_es: bool,
    pub mult_mst_en: bool,
}

#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct I2cSlvCtrl {
    pub length: u4,
    pub group: bool,
    pub reg_dis: bool,
    pub byte_swap: bool,
    pub enable: bool,
}

#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct I2cMstDelayCtrl {
    pub slv0_dly_en: bool,
    pub slv1_dly_en: bool,
    pub slv2_dly_en: bool,
    pub slv3_dly_en: bool,
    pub slv4_dly_en: bool,
    reserved_5: u2,
    pub delay_es_shadow: bool,
}

#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct IntPinCfg {
    reserved_0: u1,
    pub bypass_en: bool,
    pub fsync_int_mode_en: bool,
    pub actl_fsync: bool,
    /// Clear the interrupt status on any read
    pub int_anyrd_2clear: bool,
    /// Hold the INT pin until the interrupt is cleared
    pub latch_int_en: bool,
    pub open: bool,
    pub actl: bool,
}

/// Shared layout of INT_ENABLE and INT_STATUS
#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct Interrupts {
    pub raw_rdy: bool,
    pub dmp: bool,
    reserved_2: u1,
    pub i2c_mst: bool,
    pub fifo_oflow: bool,
    pub zmot: bool,
    pub mot: bool,
    pub ff: bool,
}

#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct UserCtrl {
    pub sig_cond_reset: bool,
    pub i2c_mst_reset: bool,
    pub fifo_reset: bool,
    pub dmp_reset: bool,
    /// Disable the primary I2C interface, SPI only
    pub i2c_if_dis: bool,
    pub i2c_mst_en: bool,
    pub fifo_en: bool,
    pub dmp_en: bool,
}

#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct PwrMgmt1 {
    pub clock: ClockSource,
    pub temp_dis: bool,
    pub gyro_standby: bool,
    pub cycle: bool,
    pub sleep: bool,
    pub device_reset: bool,
}

/// Implemented for all bitfield registers
pub trait Register: From<u8> + Copy
where
    u8: From<Self>,
{
    /// The register address
    const ADDR: u8;
}

/// Typed access to a single register through the low level driver
///
/// Obtained from one of the generated methods on [`crate::ll::MPU9250`].
pub struct RegAccessor<'a, DEV, R> {
    ll: &'a mut crate::ll::MPU9250<DEV>,
    _reg: PhantomData<R>,
}

impl<DEV, R> RegAccessor<'_, DEV, R>
where
    DEV: Device,
    R: Register,
    u8: From<R>,
{
    pub fn read(&mut self) -> Result<R, DEV::Error> {
        self.ll.read_register(R::ADDR).map(R::from)
    }

    pub fn write(&mut self, value: R) -> Result<(), DEV::Error> {
        self.ll.write_register(R::ADDR, u8::from(value), false)
    }

    /// Write and add the value to the device's checked register table
    pub fn write_checked(&mut self, value: R) -> Result<(), DEV::Error> {
        self.ll.write_register(R::ADDR, u8::from(value), true)
    }

    /// Read-modify-write
    pub fn modify<F>(&mut self, f: F) -> Result<(), DEV::Error>
    where
        F: FnOnce(&mut R),
    {
        let mut value = self.read()?;
        f(&mut value);
        self.write(value)
    }
}

/// Generates `Register` impls and the accessor methods on the low level
/// driver. USER_CTRL gets no accessor, it is only written through the
/// shadow in [`crate::ll::MPU9250::write_user_ctrl`].
macro_rules! impl_register {
    ($($addr:expr => $name:ident,)*) => {
        paste! {
            $(
                impl Register for $name {
                    const ADDR: u8 = $addr;
                }
            )*

            impl<DEV: Device> crate::ll::MPU9250<DEV> {
                $(
                    #[doc = "Access to the `" $name "` register"]
                    pub fn [<$name:snake>](&mut self) -> RegAccessor<'_, DEV, $name> {
                        RegAccessor { ll: self, _reg: PhantomData }
                    }
                )*
            }
        }
    };
}

impl_register! {
    CONFIG => Config,
    GYRO_CONFIG => GyroConfig,
    ACCEL_CONFIG => AccelConfig,
    ACCEL_CONFIG2 => AccelConfig2,
    FIFO_EN => FifoEn,
    I2C_MST_CTRL => I2cMstCtrl,
    INT_PIN_CFG => IntPinCfg,
    INT_ENABLE => Interrupts,
    I2C_MST_DELAY_CTRL => I2cMstDelayCtrl,
    PWR_MGMT_1 => PwrMgmt1,
}

impl Register for UserCtrl {
    const ADDR: u8 = USER_CTRL;
}
