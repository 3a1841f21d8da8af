use nalgebra::Vector3;

const HALF_SQRT_2: f32 = core::f32::consts::FRAC_1_SQRT_2;

/// Board mounting of the sensor relative to the vehicle body
///
/// Rotations are applied yaw first, then pitch, then roll.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    #[default]
    None,
    Yaw45,
    Yaw90,
    Yaw135,
    Yaw180,
    Yaw225,
    Yaw270,
    Yaw315,
    Roll180,
    Roll180Yaw45,
    Roll180Yaw90,
    Roll180Yaw135,
    Pitch180,
    Roll180Yaw225,
    Roll180Yaw270,
    Roll180Yaw315,
    Roll90,
    Roll270,
    Pitch90,
    Pitch270,
}

impl Rotation {
    /// Rotate `v` from the sensor frame into the body frame
    pub fn apply(self, v: Vector3<f32>) -> Vector3<f32> {
        let (x, y, z) = (v.x, v.y, v.z);
        match self {
            Rotation::None => v,
            Rotation::Yaw45 => Vector3::new(HALF_SQRT_2 * (x - y), HALF_SQRT_2 * (x + y), z),
            Rotation::Yaw90 => Vector3::new(-y, x, z),
            Rotation::Yaw135 => Vector3::new(-HALF_SQRT_2 * (x + y), HALF_SQRT_2 * (x - y), z),
            Rotation::Yaw180 => Vector3::new(-x, -y, z),
            Rotation::Yaw225 => Vector3::new(HALF_SQRT_2 * (y - x), -HALF_SQRT_2 * (x + y), z),
            Rotation::Yaw270 => Vector3::new(y, -x, z),
            Rotation::Yaw315 => Vector3::new(HALF_SQRT_2 * (x + y), HALF_SQRT_2 * (y - x), z),
            Rotation::Roll180 => Vector3::new(x, -y, -z),
            Rotation::Roll180Yaw45 => {
                Vector3::new(HALF_SQRT_2 * (x + y), HALF_SQRT_2 * (x - y), -z)
            }
            Rotation::Roll180Yaw90 => Vector3::new(y, x, -z),
            Rotation::Roll180Yaw135 => {
                Vector3::new(HALF_SQRT_2 * (y - x), HALF_SQRT_2 * (y + x), -z)
            }
            Rotation::Pitch180 => Vector3::new(-x, y, -z),
            Rotation::Roll180Yaw225 => {
                Vector3::new(-HALF_SQRT_2 * (x + y), HALF_SQRT_2 * (y - x), -z)
            }
            Rotation::Roll180Yaw270 => Vector3::new(-y, -x, -z),
            Rotation::Roll180Yaw315 => {
                Vector3::new(HALF_SQRT_2 * (x - y), -HALF_SQRT_2 * (x + y), -z)
            }
            Rotation::Roll90 => Vector3::new(x, -z, y),
            Rotation::Roll270 => Vector3::new(x, z, -y),
            Rotation::Pitch90 => Vector3::new(z, y, -x),
            Rotation::Pitch270 => Vector3::new(-z, y, x),
        }
    }
}
