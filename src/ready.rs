use embedded_hal::delay::DelayNs;

use crate::{
    aux_bus::AuxBus,
    config::Config,
    convert::SampleConverter,
    fifo::FIFO_BUFFER_LEN,
    interface::{BusSpeed, BusType, Device},
    registers::{
        AccelConfig, AccelConfig2, AccelFullScale, Config as ConfigReg, DlpfCfg, GyroConfig,
        GyroFullScale, Interrupts, PWR_MGMT_2, SMPLRT_DIV,
    },
    temperature::CorruptionOracle,
    Error, HealthCounters, Ready, Streaming, MPU9250,
};

impl<DEV: Device> MPU9250<DEV, Ready> {
    /// Configure the sensor for FIFO streaming at 1 kHz
    ///
    /// Fast sampling is only enabled when requested and the transport is
    /// SPI.
    pub fn start(
        mut self,
        config: Config,
        mut delay: impl DelayNs,
    ) -> Result<MPU9250<DEV, Streaming>, Error<DEV::Error>> {
        if !self.ll.dev.try_lock() {
            return Err(Error::BusBusy);
        }
        self.ll.dev.set_speed(BusSpeed::Low);

        let result = self.configure(&config, &mut delay);

        self.ll.dev.set_speed(BusSpeed::High);
        self.ll.dev.unlock();
        let fast = result?;

        Ok(MPU9250 {
            ll: self.ll,
            state: Streaming {
                converter: SampleConverter::new(&config, fast),
                oracle: CorruptionOracle::new(),
                buffer: [0; FIFO_BUFFER_LEN],
                counters: HealthCounters::default(),
                overflow: config.fifo_overflow,
            },
        })
    }

    /// Returns whether fast sampling was enabled
    fn configure(
        &mut self,
        config: &Config,
        delay: &mut impl DelayNs,
    ) -> Result<bool, DEV::Error> {
        // only used for wake-up in accel low power mode
        self.ll.write_register(PWR_MGMT_2, 0x00, false)?;
        delay.delay_ms(1);

        self.ll.fifo_reset()?;

        let fast = config.fast_sampling && self.ll.dev.bus_type() == BusType::Spi;
        if fast {
            info!("enabled fast sampling");
        } else if config.fast_sampling {
            warn!("fast sampling needs SPI, running at 1 kHz");
        }

        let mut cfg = ConfigReg::from(0);
        cfg.set_dlpf_cfg(if fast {
            DlpfCfg::Hz256NoLpf2
        } else {
            DlpfCfg::Hz188
        });
        cfg.set_fifo_mode_stop(true);
        self.ll.config().write_checked(cfg)?;

        // 1 kHz base rate
        self.ll.write_register(SMPLRT_DIV, 0, true)?;
        delay.delay_ms(1);

        let mut gyro = GyroConfig::from(0);
        gyro.set_full_scale(GyroFullScale::Dps2000);
        self.ll.gyro_config().write_checked(gyro)?;
        delay.delay_ms(1);

        let mut accel = AccelConfig::from(0);
        accel.set_full_scale(AccelFullScale::G16);
        self.ll.accel_config().write_checked(accel)?;

        // 4 kHz accel path in fast mode
        let mut accel2 = AccelConfig2::from(0);
        accel2.set_fchoice_b(fast);
        self.ll.accel_config2().write_checked(accel2)?;

        let mut int_enable = Interrupts::from(0);
        int_enable.set_raw_rdy(true);
        self.ll.interrupts().write(int_enable)?;

        // clear on any read, hold the pin until cleared
        self.ll.int_pin_cfg().modify(|r| {
            r.set_int_anyrd_2clear(true);
            r.set_latch_int_en(true);
        })?;

        Ok(fast)
    }

    pub fn data_ready(&mut self) -> Result<bool, DEV::Error> {
        self.ll.data_ready()
    }

    /// Auxiliary I2C master, SPI only
    pub fn aux_bus(&mut self) -> Result<AuxBus<'_, DEV>, Error<DEV::Error>> {
        AuxBus::acquire(&mut self.ll)
    }
}

#[cfg(test)]
mod test {
    extern crate alloc;
    use super::*;
    use crate::registers::{
        ACCEL_CONFIG, ACCEL_CONFIG2, CONFIG, FIFO_EN, GYRO_CONFIG, INT_ENABLE, INT_PIN_CFG,
        USER_CTRL,
    };
    use crate::testing::SimDevice;
    use crate::Uninitialized;

    use embedded_hal_mock::eh1::delay::NoopDelay as Delay;

    fn ready(sim: SimDevice) -> MPU9250<SimDevice, Ready> {
        let mut mpu = MPU9250::<_, Uninitialized>::new(sim)
            .initialize(Delay::new())
            .unwrap();
        mpu.ll().device().clear_log();
        mpu
    }

    #[test]
    fn test_start_register_presets() {
        let mut mpu = ready(SimDevice::new());
        mpu.ll().device().set_reg(INT_PIN_CFG, 0x02);
        let mut mpu = mpu.start(Config::default(), Delay::new()).unwrap();
        assert!(!mpu.is_fast_sampling());

        let sim = mpu.ll().device();
        assert_eq!(sim.reg(CONFIG), 0x41);
        assert_eq!(sim.reg(SMPLRT_DIV), 0x00);
        assert_eq!(sim.reg(GYRO_CONFIG), 0x18);
        assert_eq!(sim.reg(ACCEL_CONFIG), 0x18);
        assert_eq!(sim.reg(ACCEL_CONFIG2), 0x00);
        assert_eq!(sim.reg(INT_ENABLE), 0x01);
        assert_eq!(sim.reg(INT_PIN_CFG), 0x02 | 0x10 | 0x20);
        assert_eq!(sim.reg(FIFO_EN), 0xF8);
        assert_eq!(sim.reg(USER_CTRL), 0x50);
        assert_eq!(sim.writes[0], (PWR_MGMT_2, 0x00));
        assert_eq!(sim.speeds.first(), Some(&BusSpeed::Low));
        assert_eq!(sim.speeds.last(), Some(&BusSpeed::High));
        assert_eq!((sim.locks, sim.unlocks), (2, 2));
    }

    #[test]
    fn test_checked_register_table() {
        let mut mpu = ready(SimDevice::new())
            .start(Config::default(), Delay::new())
            .unwrap();
        let checked = mpu.ll().device().checked_registers();
        assert_eq!(checked.len(), 6);
        for reg in [FIFO_EN, CONFIG, SMPLRT_DIV, GYRO_CONFIG, ACCEL_CONFIG, ACCEL_CONFIG2] {
            assert!(checked.expected(reg).is_some());
        }
        assert_eq!(checked.expected(INT_ENABLE), None);
    }

    #[test]
    fn test_fast_sampling_on_spi() {
        let config = Config::default().with_fast_sampling(true);
        let mut mpu = ready(SimDevice::new()).start(config, Delay::new()).unwrap();
        assert!(mpu.is_fast_sampling());
        assert_eq!(mpu.ll().device().reg(CONFIG), 0x40);
        assert_eq!(mpu.ll().device().reg(ACCEL_CONFIG2), 0x08);
    }

    #[test]
    fn test_fast_sampling_ignored_on_i2c() {
        let config = Config::default().with_fast_sampling(true);
        let mut mpu = ready(SimDevice::i2c()).start(config, Delay::new()).unwrap();
        assert!(!mpu.is_fast_sampling());
        assert_eq!(mpu.ll().device().reg(CONFIG), 0x41);
        assert_eq!(mpu.ll().device().reg(ACCEL_CONFIG2), 0x00);
    }

    #[test]
    fn test_start_busy() {
        let mut mpu = ready(SimDevice::new());
        mpu.ll().device().busy = true;
        assert!(matches!(
            mpu.start(Config::default(), Delay::new()),
            Err(Error::BusBusy)
        ));
    }

    #[test]
    fn test_aux_bus_before_start() {
        let mut mpu = ready(SimDevice::new());
        let mag = mpu.aux_bus().unwrap().request_slave(0x0C).unwrap();
        assert_eq!(mag.instance(), 0);

        // the FIFO reset in start keeps the I2C master running
        let mut mpu = mpu.start(Config::default(), Delay::new()).unwrap();
        assert!(mpu.ll().user_ctrl().i2c_mst_en());
        assert_eq!(mpu.ll().device().reg(USER_CTRL), 0x70);
    }
}
