//! Record to motion sample conversion
//!
//! Two strategies share the same interface: [`DirectConverter`] emits one
//! sample per record at the native 1 kHz, [`DownsamplingConverter`] filters
//! the 8 kHz fast-sampling stream and emits one sample per 8 records. Both
//! validate every record's temperature before trusting its motion fields.

mod direct;
mod downsample;

pub use direct::DirectConverter;
pub use downsample::{DownsamplingConverter, DOWNSAMPLE_COUNT};

use crate::{
    config::Config,
    fifo::Record,
    sample::{Clock, HealthCounters, ImuSink},
    temperature::{CorruptionOracle, TemperatureSource},
};

/// A record failed temperature validation twice; the FIFO stream is out of
/// alignment and the rest of the batch must be dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Corrupted;

/// Everything a converter touches besides its own state
pub struct Ingest<'a, T, K, C> {
    pub oracle: &'a mut CorruptionOracle,
    pub source: &'a mut T,
    pub sink: &'a mut K,
    pub clock: &'a C,
    pub counters: &'a mut HealthCounters,
}

impl<T, K, C> Ingest<'_, T, K, C>
where
    T: TemperatureSource,
{
    fn validate(&mut self, record: &Record) -> Result<(), Corrupted> {
        let raw = record.temperature_raw();
        if self.oracle.validate(raw, &mut *self.source) {
            Ok(())
        } else {
            warn!(
                "temperature jump: reference {} probe {} delta {}",
                self.oracle.reference(),
                raw,
                i32::from(raw) - i32::from(self.oracle.reference())
            );
            Err(Corrupted)
        }
    }
}

/// Conversion strategy, chosen once at start
#[derive(Debug, Clone)]
pub enum SampleConverter {
    Direct(DirectConverter),
    Downsampling(DownsamplingConverter),
}

impl SampleConverter {
    /// `fast` is the already resolved fast-sampling decision
    pub fn new(config: &Config, fast: bool) -> Self {
        if fast {
            SampleConverter::Downsampling(DownsamplingConverter::new(config))
        } else {
            SampleConverter::Direct(DirectConverter::new(config))
        }
    }

    pub fn is_downsampling(&self) -> bool {
        matches!(self, SampleConverter::Downsampling(_))
    }

    /// Convert one drained block
    ///
    /// Stops at the first corrupted record. Samples already emitted for
    /// earlier records stay emitted.
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
        match self {
            SampleConverter::Direct(c) => c.process(records, ingest),
            SampleConverter::Downsampling(c) => c.process(records, ingest),
        }
    }

    /// Filtered die temperature in °C, once a record has been accepted
    pub fn temperature(&self) -> Option<f32> {
        match self {
            SampleConverter::Direct(c) => c.temperature(),
            SampleConverter::Downsampling(c) => c.temperature(),
        }
    }
}


#[cfg(test)]
mod test {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_strategy_selection() {
        let config = Config::default();
        assert!(!SampleConverter::new(&config, false).is_downsampling());
        assert!(SampleConverter::new(&config, true).is_downsampling());
    }

    #[test]
    fn test_no_temperature_before_first_record() {
        let mut converter = SampleConverter::new(&Config::default(), false);
        assert_eq!(converter.temperature(), None);

        let mut h = Harness::new(0);
        let clock = || 0u64;
        let records = [Record::from_raw([0; 3], 0, [0; 3])];
        converter.process(&records, &mut ingest!(h, &clock)).unwrap();
        let t = converter.temperature().unwrap();
        assert!((t - 36.53).abs() < 1e-3);
    }
}
