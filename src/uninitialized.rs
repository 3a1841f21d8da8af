use embedded_hal::delay::DelayNs;

use crate::{
    interface::{BusSpeed, BusType, Device},
    registers::{ClockSource, PwrMgmt1, WHOAMI_MPU9250, WHOAMI_MPU9255},
    Error, Ready, Uninitialized, MPU9250,
};

/// Checked registers are verified one every this many sampling ticks
pub const CHECK_REGISTER_FREQUENCY: u8 = 20;

/// Reset and wake attempts before giving up
pub const WAKE_ATTEMPTS: u8 = 5;

impl<DEV> MPU9250<DEV, Uninitialized> {
    pub fn new(dev: DEV) -> Self {
        MPU9250 {
            ll: crate::ll::MPU9250::new(dev),
            state: Uninitialized,
        }
    }
}

impl<DEV: Device> MPU9250<DEV, Uninitialized> {
    /// Identify the chip, reset it and bring it out of sleep
    ///
    /// Holds the bus lock and runs the bus at low speed for the duration.
    pub fn initialize(
        mut self,
        mut delay: impl DelayNs,
    ) -> Result<MPU9250<DEV, Ready>, Error<DEV::Error>> {
        if !self.ll.dev.try_lock() {
            return Err(Error::BusBusy);
        }

        self.ll
            .dev
            .checked_registers()
            .setup(CHECK_REGISTER_FREQUENCY);
        self.ll.dev.set_speed(BusSpeed::Low);

        let result = self.bring_up(&mut delay);

        self.ll.dev.set_speed(BusSpeed::High);
        self.ll.dev.unlock();
        result?;

        Ok(MPU9250 {
            ll: self.ll,
            state: Ready,
        })
    }

    fn bring_up(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<DEV::Error>> {
        let who_am_i = self.ll.who_am_i()?;
        if who_am_i != WHOAMI_MPU9250 && who_am_i != WHOAMI_MPU9255 {
            error!("unexpected WHO_AM_I 0x{:x}", who_am_i);
            return Err(Error::WhoAmIMismatch(who_am_i));
        }

        for attempt in 0..WAKE_ATTEMPTS {
            if self.wake(delay)? {
                debug!("awake after {} attempt(s)", attempt + 1);
                return Ok(());
            }
        }

        error!("failed to boot {} times", WAKE_ATTEMPTS);
        Err(Error::WakeupFailed)
    }

    /// One reset and wake cycle, `true` once the chip is running
    fn wake(&mut self, delay: &mut impl DelayNs) -> Result<bool, DEV::Error> {
        let mut user_ctrl = self.ll.load_user_ctrl()?;

        // A running I2C master can hang the auxiliary slaves across the
        // reset. It is enabled again when the auxiliary bus is used.
        if user_ctrl.i2c_mst_en() {
            user_ctrl.set_i2c_mst_en(false);
            self.ll.write_user_ctrl(user_ctrl)?;
            delay.delay_ms(10);
        }

        let mut reset = PwrMgmt1::from(0);
        reset.set_device_reset(true);
        self.ll.pwr_mgmt1().write(reset)?;
        delay.delay_ms(100);

        // Disable the I2C slave interface right after reset when on SPI
        if self.ll.dev.bus_type() == BusType::Spi {
            user_ctrl.set_i2c_if_dis(true);
            self.ll.write_user_ctrl(user_ctrl)?;
        }

        // The chip starts asleep and may take a while to come out of it
        let mut running = PwrMgmt1::from(0);
        running.set_clock(ClockSource::PllZGyro);
        self.ll.pwr_mgmt1().write(running)?;
        delay.delay_ms(5);

        if self.ll.pwr_mgmt1().read()? == running {
            return Ok(true);
        }

        delay.delay_ms(10);
        self.ll.data_ready()
    }
}

#[cfg(test)]
mod test {
    extern crate alloc;
    use super::*;
    use crate::registers::{INT_STATUS, PWR_MGMT_1, USER_CTRL, WHOAMI};
    use crate::testing::SimDevice;
    use alloc::vec;

    use embedded_hal_mock::eh1::delay::NoopDelay as Delay;

    #[test]
    fn test_initialize_spi() {
        let mpu = MPU9250::new(SimDevice::new());
        let mut mpu = mpu.initialize(Delay::new()).unwrap();

        let ctrl = mpu.ll().user_ctrl();
        assert!(ctrl.i2c_if_dis());
        assert!(!ctrl.i2c_mst_en());

        let sim = mpu.ll().device();
        assert_eq!(
            sim.writes,
            vec![(PWR_MGMT_1, 0x80), (USER_CTRL, 0x10), (PWR_MGMT_1, 0x03)]
        );
        assert_eq!(sim.speeds, vec![BusSpeed::Low, BusSpeed::High]);
        assert_eq!((sim.locks, sim.unlocks), (1, 1));
        assert_eq!(sim.device_resets, 1);
    }

    #[test]
    fn test_initialize_i2c_keeps_slave_interface() {
        let mpu = MPU9250::new(SimDevice::i2c());
        let mut mpu = mpu.initialize(Delay::new()).unwrap();

        assert_eq!(
            mpu.ll().device().writes,
            vec![(PWR_MGMT_1, 0x80), (PWR_MGMT_1, 0x03)]
        );
        assert!(!mpu.ll().user_ctrl().i2c_if_dis());
    }

    #[test]
    fn test_i2c_master_stopped_before_reset() {
        let mut sim = SimDevice::new();
        sim.set_reg(USER_CTRL, 0x20);
        let mut mpu = MPU9250::new(sim).initialize(Delay::new()).unwrap();

        assert_eq!(
            mpu.ll().device().writes[..2],
            [(USER_CTRL, 0x00), (PWR_MGMT_1, 0x80)]
        );
    }

    #[test]
    fn test_accepts_mpu9255() {
        let mut sim = SimDevice::new();
        sim.set_reg(WHOAMI, WHOAMI_MPU9255);
        assert!(MPU9250::new(sim).initialize(Delay::new()).is_ok());
    }

    #[test]
    fn test_who_am_i_mismatch() {
        let mut sim = SimDevice::new();
        sim.set_reg(WHOAMI, 0x70);
        let result = MPU9250::new(sim).initialize(Delay::new());
        assert!(matches!(result, Err(Error::WhoAmIMismatch(0x70))));
    }

    #[test]
    fn test_data_ready_counts_as_awake() {
        let mut sim = SimDevice::new();
        sim.stuck_asleep = true;
        sim.set_reg(INT_STATUS, 0x01);
        let mut mpu = MPU9250::new(sim).initialize(Delay::new()).unwrap();
        assert_eq!(mpu.ll().device().device_resets, 1);
    }

    #[test]
    fn test_wakeup_failure_after_five_attempts() {
        let mut sim = SimDevice::new();
        sim.stuck_asleep = true;
        let result = MPU9250::new(sim).initialize(Delay::new());
        assert!(matches!(result, Err(Error::WakeupFailed)));
    }

    #[test]
    fn test_busy_bus() {
        let mut sim = SimDevice::new();
        sim.busy = true;
        let result = MPU9250::new(sim).initialize(Delay::new());
        assert!(matches!(result, Err(Error::BusBusy)));
    }

    #[test]
    fn test_bus_error_is_fatal() {
        let mut sim = SimDevice::new();
        sim.fail_reads = true;
        let result = MPU9250::new(sim).initialize(Delay::new());
        assert!(matches!(result, Err(Error::Bus(_))));
    }
}
