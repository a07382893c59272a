//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use num_traits::Float;

/// Three valued sign function.
///
/// Unlike `f64::signum` a zero (of either sign) maps to zero, and `NaN` maps
/// to zero too so that it cannot leak into a feed-forward term.
pub fn sign<T>(value: T) -> T
where
    T: Float
{
    if value > T::zero() {
        T::one()
    }
    else if value < T::zero() {
        -T::one()
    }
    else {
        T::zero()
    }
}

/// Element-wise three valued sign of a 3-vector.
pub fn sign_vec3(value: &Vector3<f64>) -> Vector3<f64> {
    value.map(sign)
}

/// Clamp the magnitude of a value to `limit`, preserving its sign.
///
/// Returns `sign(value) * min(|value|, limit)`. `limit` must be positive.
/// `NaN` is returned unchanged, an undefined value must stay undefined.
pub fn sym_clamp<T>(value: T, limit: T) -> T
where
    T: Float
{
    if value.is_nan() {
        return value
    }

    sign(value) * value.abs().min(limit)
}

/// Return the largest absolute element of a 3-vector.
pub fn max_abs_vec3(value: &Vector3<f64>) -> f64 {
    value.iter().fold(0f64, |acc, v| acc.max(v.abs()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sign() {
        assert_eq!(sign(2.5f64), 1.0);
        assert_eq!(sign(-0.001f64), -1.0);
        assert_eq!(sign(0f64), 0.0);
        assert_eq!(sign(-0f64), 0.0);
        assert_eq!(sign(std::f64::NAN), 0.0);

        assert_eq!(
            sign_vec3(&Vector3::new(-3.0, 0.0, 0.2)),
            Vector3::new(-1.0, 0.0, 1.0)
        );
    }

    #[test]
    fn test_sym_clamp() {
        assert_eq!(sym_clamp(1.5f64, 0.9999), 0.9999);
        assert_eq!(sym_clamp(-1.5f64, 0.99), -0.99);
        assert_eq!(sym_clamp(0.5f64, 0.99), 0.5);
        assert_eq!(sym_clamp(0f64, 0.99), 0.0);
        assert!(sym_clamp(std::f64::NAN, 0.99).is_nan());
        assert_eq!(sym_clamp(std::f64::INFINITY, 0.99), 0.99);

        // Clamping is idempotent
        for v in [-3.0f64, -0.9999, -0.2, 0.0, 0.7, 0.99995, 12.0].iter() {
            let once = sym_clamp(*v, 0.9999);
            assert_eq!(sym_clamp(once, 0.9999), once);
        }
    }

    #[test]
    fn test_max_abs_vec3() {
        assert_eq!(max_abs_vec3(&Vector3::new(0.1, -0.7, 0.3)), 0.7);
        assert_eq!(max_abs_vec3(&Vector3::zeros()), 0.0);
    }
}
