//! Temperature conversion and FIFO corruption detection
//!
//! Die temperature changes slowly, so a record whose temperature jumps away
//! from the last known reading almost certainly means the FIFO byte stream
//! has slipped out of alignment.

/// Largest accepted difference, in LSB, between a record's temperature and
/// the reference reading
pub const MAX_TEMPERATURE_JUMP: i32 = 400;

/// Raw temperature to degrees Celsius
pub fn celsius(raw: f32) -> f32 {
    raw / 340.0 + 36.53
}

/// Fresh read of the temperature output registers
pub trait TemperatureSource {
    /// `None` if the bus read failed
    fn read_raw_temperature(&mut self) -> Option<i16>;
}

/// Validates records against a cached temperature reference
#[derive(Debug, Default, Clone)]
pub struct CorruptionOracle {
    reference: i16,
}

impl CorruptionOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference(reference: i16) -> Self {
        CorruptionOracle { reference }
    }

    pub fn reference(&self) -> i16 {
        self.reference
    }

    /// Accept `raw` if it is close to the cached reference
    ///
    /// A miss refreshes the reference with one register read and compares
    /// again. A failed read keeps the stale reference.
    pub fn validate(&mut self, raw: i16, source: &mut impl TemperatureSource) -> bool {
        if self.is_close(raw) {
            return true;
        }
        if let Some(fresh) = source.read_raw_temperature() {
            self.reference = fresh;
        }
        self.is_close(raw)
    }

    fn is_close(&self, raw: i16) -> bool {
        (i32::from(raw) - i32::from(self.reference)).abs() < MAX_TEMPERATURE_JUMP
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Probe {
        value: Option<i16>,
        reads: usize,
    }

    impl TemperatureSource for Probe {
        fn read_raw_temperature(&mut self) -> Option<i16> {
            self.reads += 1;
            self.value
        }
    }

    #[test]
    fn test_close_value_needs_no_read() {
        let mut oracle = CorruptionOracle::with_reference(1000);
        let mut probe = Probe {
            value: Some(0),
            reads: 0,
        };
        assert!(oracle.validate(1399, &mut probe));
        assert!(oracle.validate(601, &mut probe));
        assert_eq!(probe.reads, 0);
        assert_eq!(oracle.reference(), 1000);
    }

    #[test]
    fn test_stale_reference_is_refreshed() {
        let mut oracle = CorruptionOracle::new();
        let mut probe = Probe {
            value: Some(2500),
            reads: 0,
        };
        assert!(oracle.validate(2510, &mut probe));
        assert_eq!(probe.reads, 1);
        assert_eq!(oracle.reference(), 2500);
    }

    #[test]
    fn test_jump_confirmed_by_reread() {
        let mut oracle = CorruptionOracle::with_reference(1000);
        let mut probe = Probe {
            value: Some(1000),
            reads: 0,
        };
        assert!(!oracle.validate(1400, &mut probe));
        assert_eq!(probe.reads, 1);
    }

    #[test]
    fn test_failed_reread_keeps_reference() {
        let mut oracle = CorruptionOracle::with_reference(-200);
        let mut probe = Probe {
            value: None,
            reads: 0,
        };
        assert!(!oracle.validate(i16::MAX, &mut probe));
        assert_eq!(oracle.reference(), -200);
    }

    #[test]
    fn test_celsius() {
        assert!((celsius(0.0) - 36.53).abs() < 1e-4);
        assert!((celsius(340.0) - 37.53).abs() < 1e-4);
    }
}
