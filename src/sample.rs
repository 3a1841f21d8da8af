use nalgebra::Vector3;

/// Interval, in microseconds, at which [`crate::MPU9250::read_sample`] is
/// expected to be called
pub const SAMPLE_PERIOD_US: u32 = 1000;

/// Standard gravity in m/s²
pub const GRAVITY: f32 = 9.80665;

/// m/s² per LSB at ±16 g
pub const ACCEL_SCALE: f32 = GRAVITY / 2048.0;

/// rad/s per LSB at ±2000 °/s
pub const GYRO_SCALE: f32 = core::f32::consts::PI / 180.0 / 16.4;

/// One converted motion sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// Acceleration in m/s², body frame
    pub accel: Vector3<f32>,
    /// Angular rate in rad/s, body frame
    pub gyro: Vector3<f32>,
    /// Monotonic timestamp in microseconds
    pub timestamp_us: u64,
    /// Set when the accel value repeats an earlier hardware reading
    pub duplicate: bool,
}

/// Consumer of converted samples
pub trait ImuSink {
    fn motion_sample(&mut self, sample: &MotionSample);
}

impl<F> ImuSink for F
where
    F: FnMut(&MotionSample),
{
    fn motion_sample(&mut self, sample: &MotionSample) {
        self(sample)
    }
}

/// Monotonic microsecond time source
pub trait Clock {
    fn micros(&self) -> u64;
}

impl<F> Clock for F
where
    F: Fn() -> u64,
{
    fn micros(&self) -> u64 {
        self()
    }
}

/// Soft health statistics collected by the sampling task
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HealthCounters {
    /// Failed bus integrity checks, seen from the gyro side
    pub gyro_errors: u32,
    /// Failed bus integrity checks, seen from the accel side
    pub accel_errors: u32,
    /// Batches in which the accel saturated
    pub accel_clips: u32,
    /// FIFO resets issued by the sampling task
    pub fifo_resets: u32,
    /// Ticks on which the FIFO held more than the overflow threshold
    pub overflows: u32,
}

impl HealthCounters {
    pub(crate) fn bus_error(&mut self) {
        self.gyro_errors = self.gyro_errors.wrapping_add(1);
        self.accel_errors = self.accel_errors.wrapping_add(1);
    }

    pub(crate) fn clip(&mut self) {
        self.accel_clips = self.accel_clips.wrapping_add(1);
    }

    pub(crate) fn fifo_reset(&mut self) {
        self.fifo_resets = self.fifo_resets.wrapping_add(1);
    }

    pub(crate) fn overflow(&mut self) {
        self.overflows = self.overflows.wrapping_add(1);
    }
}
