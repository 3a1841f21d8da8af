use crate::{
    config::Config,
    fifo::Record,
    filter::LowPassFilter,
    rotation::Rotation,
    sample::{Clock, ImuSink, MotionSample, ACCEL_SCALE, GYRO_SCALE},
    temperature::{celsius, TemperatureSource},
};

use super::{Corrupted, Ingest};

/// One sample per record at the native rate
#[derive(Debug, Clone)]
pub struct DirectConverter {
    rotation: Rotation,
    temperature: LowPassFilter,
}

impl DirectConverter {
    pub fn new(config: &Config) -> Self {
        DirectConverter {
            rotation: config.rotation,
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
        for record in records {
            ingest.validate(record)?;

            let accel = self.rotation.apply(record.accel_remapped() * ACCEL_SCALE);
            let gyro = self.rotation.apply(record.gyro_remapped() * GYRO_SCALE);
            ingest.sink.motion_sample(&MotionSample {
                accel,
                gyro,
                timestamp_us: ingest.clock.micros(),
                duplicate: false,
            });

            self.temperature
                .apply(celsius(f32::from(record.temperature_raw())));
        }
        Ok(())
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature.output()
    }
}
