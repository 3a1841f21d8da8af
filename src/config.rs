use crate::{fifo::OverflowPolicy, rotation::Rotation};

/// Streaming configuration handed to [`crate::MPU9250::start`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Sample at 8 kHz and downsample to 1 kHz. Only honored on SPI.
    pub fast_sampling: bool,
    /// Accel magnitude, in g, above which a reading counts as clipped
    pub accel_clip_limit_g: f32,
    /// Board mounting
    pub rotation: Rotation,
    pub fifo_overflow: OverflowPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            fast_sampling: false,
            accel_clip_limit_g: 15.5,
            rotation: Rotation::None,
            fifo_overflow: OverflowPolicy::default(),
        }
    }
}

impl Config {
    pub fn with_fast_sampling(mut self, enabled: bool) -> Self {
        self.fast_sampling = enabled;
        self
    }

    pub fn with_accel_clip_limit_g(mut self, limit: f32) -> Self {
        self.accel_clip_limit_g = limit;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_fifo_overflow(mut self, policy: OverflowPolicy) -> Self {
        self.fifo_overflow = policy;
        self
    }

    /// Clip limit in raw accel LSB
    pub(crate) fn accel_clip_limit_raw(&self) -> f32 {
        self.accel_clip_limit_g * crate::sample::GRAVITY / crate::sample::ACCEL_SCALE
    }
}
