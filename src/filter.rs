use core::f32::consts::PI;

use nalgebra::Vector3;

/// Blend factor of a single-pole low pass filter
fn alpha(sample_hz: f32, cutoff_hz: f32) -> f32 {
    if cutoff_hz <= 0.0 || sample_hz <= 0.0 {
        return 1.0;
    }
    let dt = 1.0 / sample_hz;
    let rc = 1.0 / (2.0 * PI * cutoff_hz);
    dt / (dt + rc)
}

/// Single-pole low pass filter
///
/// The first sample seeds the output.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    alpha: f32,
    output: Option<f32>,
}

impl LowPassFilter {
    pub fn new(sample_hz: f32, cutoff_hz: f32) -> Self {
        LowPassFilter {
            alpha: alpha(sample_hz, cutoff_hz),
            output: None,
        }
    }

    pub fn apply(&mut self, sample: f32) -> f32 {
        let out = match self.output {
            Some(prev) => prev + (sample - prev) * self.alpha,
            None => sample,
        };
        self.output = Some(out);
        out
    }

    pub fn output(&self) -> Option<f32> {
        self.output
    }
}

/// [`LowPassFilter`] applied per axis
#[derive(Debug, Clone)]
pub struct LowPassFilterVector {
    alpha: f32,
    output: Option<Vector3<f32>>,
}

impl LowPassFilterVector {
    pub fn new(sample_hz: f32, cutoff_hz: f32) -> Self {
        LowPassFilterVector {
            alpha: alpha(sample_hz, cutoff_hz),
            output: None,
        }
    }

    pub fn apply(&mut self, sample: Vector3<f32>) -> Vector3<f32> {
        let out = match self.output {
            Some(prev) => prev + (sample - prev) * self.alpha,
            None => sample,
        };
        self.output = Some(out);
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_first_sample_seeds() {
        let mut lpf = LowPassFilter::new(1000.0, 1.0);
        assert_eq!(lpf.output(), None);
        assert_eq!(lpf.apply(25.0), 25.0);
        assert_eq!(lpf.apply(25.0), 25.0);
    }

    #[test]
    fn test_step_response_is_gradual() {
        let mut lpf = LowPassFilter::new(1000.0, 1.0);
        lpf.apply(0.0);
        let out = lpf.apply(100.0);
        assert!(out > 0.0 && out < 1.0);
        for _ in 0..10_000 {
            lpf.apply(100.0);
        }
        assert!((lpf.output().unwrap() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_vector_filter_axes_are_independent() {
        let mut lpf = LowPassFilterVector::new(8000.0, 188.0);
        lpf.apply(Vector3::new(1.0, 2.0, 3.0));
        let out = lpf.apply(Vector3::new(1.0, 12.0, 3.0));
        assert_eq!(out.x, 1.0);
        assert_eq!(out.z, 3.0);
        assert!(out.y > 2.0 && out.y < 12.0);
    }

    #[test]
    fn test_zero_cutoff_passes_through() {
        let mut lpf = LowPassFilter::new(1000.0, 0.0);
        lpf.apply(1.0);
        assert_eq!(lpf.apply(5.0), 5.0);
    }
}
