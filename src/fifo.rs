use bytemuck::{AnyBitPattern, NoUninit};
use nalgebra::Vector3;

/// Size of one FIFO record in bytes
pub const RECORD_SIZE: usize = 14;

/// Records staged per bus transfer
pub const FIFO_BUFFER_RECORDS: usize = 16;

pub const FIFO_BUFFER_LEN: usize = FIFO_BUFFER_RECORDS * RECORD_SIZE;

/// One FIFO record: accel, temperature and gyro, big-endian
///
/// The layout is fixed by FIFO_EN; only the interpretation differs between
/// sampling modes.
#[derive(Debug, Clone, Copy, PartialEq, NoUninit, AnyBitPattern, Default)]
#[repr(C)]
pub struct Record {
    pub accel: [[u8; 2]; 3],
    pub temperature: [u8; 2],
    pub gyro: [[u8; 2]; 3],
}

// Assert that the size of the struct is 14 bytes
const _SIZE_CHECK: usize = (core::mem::size_of::<Record>() == RECORD_SIZE) as usize - 1;

impl Record {
    /// Build a record from raw sensor-frame values, used by tests and
    /// simulators
    pub fn from_raw(accel: [i16; 3], temperature: i16, gyro: [i16; 3]) -> Self {
        Record {
            accel: accel.map(i16::to_be_bytes),
            temperature: temperature.to_be_bytes(),
            gyro: gyro.map(i16::to_be_bytes),
        }
    }

    pub fn accel_raw(&self) -> [i16; 3] {
        self.accel.map(i16::from_be_bytes)
    }

    pub fn gyro_raw(&self) -> [i16; 3] {
        self.gyro.map(i16::from_be_bytes)
    }

    pub fn temperature_raw(&self) -> i16 {
        i16::from_be_bytes(self.temperature)
    }

    /// Accel in body axes, still in LSB
    ///
    /// The package mounts the sensor with X and Y swapped and Z inverted.
    pub fn accel_remapped(&self) -> Vector3<f32> {
        remap(self.accel_raw())
    }

    /// Gyro in body axes, still in LSB
    pub fn gyro_remapped(&self) -> Vector3<f32> {
        remap(self.gyro_raw())
    }

    /// Largest absolute accel reading over the three axes, in LSB
    pub fn accel_peak(&self) -> i32 {
        self.accel_raw()
            .iter()
            .map(|&v| i32::from(v).abs())
            .max()
            .unwrap_or(0)
    }
}

#[inline]
fn remap(v: [i16; 3]) -> Vector3<f32> {
    Vector3::new(v[1] as f32, v[0] as f32, -(v[2] as f32))
}

/// View a filled region of the working buffer as records
///
/// Trailing bytes that do not form a whole record are ignored.
pub fn records(bytes: &[u8]) -> &[Record] {
    let whole = bytes.len() / RECORD_SIZE * RECORD_SIZE;
    bytemuck::cast_slice(&bytes[..whole])
}

/// What to do with the FIFO contents on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatchPlan {
    /// Records to drain this tick
    pub records: usize,
    /// Reset the FIFO once draining is done
    pub reset_after: bool,
}

/// Limits applied when the hardware FIFO holds too much data
///
/// Past `threshold` records the tail of the FIFO is unreliable; only the
/// first `truncate_to` records are drained and the rest is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OverflowPolicy {
    pub threshold: usize,
    pub truncate_to: usize,
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        OverflowPolicy {
            threshold: 32,
            truncate_to: 24,
        }
    }
}

impl OverflowPolicy {
    pub fn plan(&self, pending_bytes: u16) -> BatchPlan {
        let records = pending_bytes as usize / RECORD_SIZE;
        if records > self.threshold {
            BatchPlan {
                records: self.truncate_to.min(records),
                reset_after: true,
            }
        } else {
            BatchPlan {
                records,
                reset_after: false,
            }
        }
    }
}
