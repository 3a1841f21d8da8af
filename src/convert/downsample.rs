use nalgebra::Vector3;

use crate::{
    config::Config,
    fifo::Record,
    filter::{LowPassFilter, LowPassFilterVector},
    rotation::Rotation,
    sample::{Clock, ImuSink, MotionSample, ACCEL_SCALE, GYRO_SCALE},
    temperature::{celsius, TemperatureSource},
};

use super::{Corrupted, Ingest};

/// Records folded into one emitted sample
pub const DOWNSAMPLE_COUNT: u8 = 8;

/// Filter-then-decimate conversion of the fast-sampling stream
///
/// Gyro arrives at 8 kHz. Accel arrives at 4 kHz with every record pair
/// repeating the same reading, so only even positions in the window
/// contribute accel.
#[derive(Debug, Clone)]
pub struct DownsamplingConverter {
    rotation: Rotation,
    clip_limit: f32,
    accel_filter: LowPassFilterVector,
    gyro_filter: LowPassFilterVector,
    accel_sum: Vector3<f32>,
    gyro_sum: Vector3<f32>,
    count: u8,
    temperature: LowPassFilter,
}

impl DownsamplingConverter {
    pub fn new(config: &Config) -> Self {
        DownsamplingConverter {
            rotation: config.rotation,
            clip_limit: config.accel_clip_limit_raw(),
            accel_filter: LowPassFilterVector::new(4000.0, 188.0),
            gyro_filter: LowPassFilterVector::new(8000.0, 188.0),
            accel_sum: Vector3::zeros(),
            gyro_sum: Vector3::zeros(),
            count: 0,
            temperature: LowPassFilter::new(1000.0, 1.0),
        }
    }

    pub fn process<T, K, C>(
        &mut self,
        records: &[Record],
        ingest: &mut Ingest<'_, T, K, C>,
    ) -> Result<(), Corrupted>
    where
        T: TemperatureSource,
        K: ImuSink,
        C: Clock,
    {
        let mut clipped = false;
        let mut temperature_sum: i32 = 0;
        let mut result = Ok(());

        for record in records {
            if let Err(e) = ingest.validate(record) {
                result = Err(e);
                break;
            }
            temperature_sum += i32::from(record.temperature_raw());

            if self.count % 2 == 0 {
                if record.accel_peak() as f32 > self.clip_limit {
                    clipped = true;
                }
                self.accel_sum += self.accel_filter.apply(record.accel_remapped());
            }
            self.gyro_sum += self.gyro_filter.apply(record.gyro_remapped());

            self.count += 1;
            if self.count == DOWNSAMPLE_COUNT {
                self.emit(ingest);
            }
        }

        if clipped {
            ingest.counters.clip();
        }
        if result.is_ok() && !records.is_empty() {
            let mean = temperature_sum as f32 / records.len() as f32;
            self.temperature.apply(celsius(mean));
        }
        result
    }

    fn emit<T, K, C>(&mut self, ingest: &mut Ingest<'_, T, K, C>)
    where
        K: ImuSink,
        C: Clock,
    {
        let accel_scale = ACCEL_SCALE / f32::from(DOWNSAMPLE_COUNT / 2);
        let gyro_scale = GYRO_SCALE / f32::from(DOWNSAMPLE_COUNT);
        let sample = MotionSample {
            accel: self.rotation.apply(self.accel_sum * accel_scale),
            gyro: self.rotation.apply(self.gyro_sum * gyro_scale),
            timestamp_us: ingest.clock.micros(),
            duplicate: false,
        };
        ingest.sink.motion_sample(&sample);

        self.accel_sum = Vector3::zeros();
        self.gyro_sum = Vector3::zeros();
        self.count = 0;
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature.output()
    }

    /// Records accumulated towards the next sample
    pub fn pending(&self) -> u8 {
        self.count
    }
}
