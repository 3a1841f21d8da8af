#![no_std]
#![cfg_attr(not(doctest), doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md")))]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod aux_bus;
pub mod config;
pub mod convert;
pub mod fifo;
pub mod filter;
pub mod interface;
pub mod ll;
pub mod ready;
pub mod registers;
pub mod rotation;
pub mod sample;
pub mod streaming;
pub mod temperature;
pub mod uninitialized;

#[cfg(test)]
pub(crate) mod testing;

pub use aux_bus::{AuxBus, AuxSlave};
pub use config::Config;
pub use fifo::OverflowPolicy;
pub use interface::{BusSpeed, BusType, Device, I2cInterface, SpiInterface};
pub use rotation::Rotation;
pub use sample::{Clock, HealthCounters, ImuSink, MotionSample, SAMPLE_PERIOD_US};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Transport error
    Bus(E),
    /// Unknown chip, carries the WHO_AM_I value read
    WhoAmIMismatch(u8),
    /// The chip did not leave sleep after repeated resets
    WakeupFailed,
    /// Exclusive bus access was not granted
    BusBusy,
    /// The transport has no auxiliary I2C master (I2C transport)
    NoAuxiliaryBus,
    /// All auxiliary slots are allocated
    AuxNoFreeSlot,
    /// The periodic read window does not fit in EXT_SENS_DATA
    AuxCapacityExceeded,
    /// One-shot transfer requested on a slot configured for periodic reads
    AuxSlaveBusy,
    /// Staged data requested before periodic reads were configured
    AuxSlaveNotConfigured,
    /// Transfer length out of range or buffer too small
    InvalidLength,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Bus(e)
    }
}

/// Constructed, nothing written to the chip yet
#[derive(Debug)]
pub struct Uninitialized;

/// Chip identified and awake
#[derive(Debug)]
pub struct Ready;

/// Streaming through the FIFO
///
/// Holds everything the sampling task mutates between ticks.
pub struct Streaming {
    pub(crate) converter: convert::SampleConverter,
    pub(crate) oracle: temperature::CorruptionOracle,
    pub(crate) buffer: [u8; fifo::FIFO_BUFFER_LEN],
    pub(crate) counters: HealthCounters,
    pub(crate) overflow: OverflowPolicy,
}

/// MPU-9250 top-level driver
///
/// Usage:
///
/// ```rust,ignore
/// # use embedded_hal_mock::eh1::spi::Mock as SpiMock;
/// # use embedded_hal_mock::eh1::digital::Mock as PinMock;
/// # use embedded_hal_mock::eh1::digital::{State as PinState, Transaction as PinTransaction};
/// # use embedded_hal_mock::eh1::delay::NoopDelay as Delay;
/// fn main() {
///     let spi = SpiMock::new(&[]);
///     let pin = PinMock::new(&[PinTransaction::set(PinState::High)]);
///     let spidev =
///         embedded_hal_bus::spi::ExclusiveDevice::new_no_delay(spi, pin).unwrap();
///     let mpu = mpu92xx::MPU9250::new(mpu92xx::SpiInterface::new(spidev));
///     let mpu = mpu.initialize(Delay).unwrap();
///     let mut mpu = mpu.start(mpu92xx::Config::default(), Delay).unwrap();
///
///     let clock = || 0u64; // board timer in microseconds
///     let mut sink = |s: &mpu92xx::MotionSample| { /* feed the estimator */ };
///     loop {
///         // every SAMPLE_PERIOD_US
///         mpu.read_sample(&mut sink, &clock);
///     }
/// }
/// ```
pub struct MPU9250<DEV, State> {
    ll: crate::ll::MPU9250<DEV>,
    state: State,
}

impl<DEV, State> MPU9250<DEV, State> {
    /// Direct low level access to the underlying peripheral
    pub fn ll(&mut self) -> &mut crate::ll::MPU9250<DEV> {
        &mut self.ll
    }

    /// Release the transport
    pub fn release(self) -> DEV {
        self.ll.release()
    }
}
