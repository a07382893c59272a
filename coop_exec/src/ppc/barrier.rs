//! Logarithmic barrier transform

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

// Internal
use util::maths::{max_abs_vec3, sym_clamp};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Saturation and warning limits on the normalised error of one loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarrierLimits {
    /// Normalised errors are clamped to `[-clamp, clamp]` before the
    /// transform.
    pub clamp: f64,

    /// A normalised error magnitude above this raises the numerical
    /// instability warning.
    pub warn: f64,
}

/// Result of transforming one error vector.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BarrierOutput {
    /// Normalised error before clamping.
    pub xi: Vector3<f64>,

    /// Transformed error `ln((1 + xi) / (1 - xi))` of the clamped `xi`.
    /// `NaN` where `xi` is `NaN`.
    pub eps: Vector3<f64>,

    /// Diagonal of `R = diag(2 / (1 - xi^2))` of the clamped `xi`.
    pub r: Vector3<f64>,

    /// True if any normalised error left the warning band or is not finite.
    pub warn: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl BarrierLimits {
    /// Limits of the position loop.
    pub const POSITION: BarrierLimits = BarrierLimits {
        clamp: 0.9999,
        warn: 0.9998,
    };

    /// Limits of the velocity loop.
    pub const VELOCITY: BarrierLimits = BarrierLimits {
        clamp: 0.99,
        warn: 0.98,
    };

    pub fn validate(&self) -> Result<(), String> {
        if !(self.clamp > 0.0 && self.clamp < 1.0) {
            return Err(format!("clamp must be in (0, 1), got {}", self.clamp));
        }
        if !(self.warn > 0.0 && self.warn < self.clamp) {
            return Err(format!(
                "warn must be in (0, clamp = {}), got {}",
                self.clamp, self.warn
            ));
        }

        Ok(())
    }
}

impl BarrierOutput {
    /// `rho^-1 R eps`, the envelope scaled transformed error.
    pub fn scaled(&self, rho: &Vector3<f64>) -> Vector3<f64> {
        self.r.component_mul(&self.eps).component_div(rho)
    }

    pub fn r_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_diagonal(&self.r)
    }
}

/// Barrier function of a single normalised error.
pub fn barrier(xi: f64) -> f64 {
    ((1.0 + xi) / (1.0 - xi)).ln()
}

/// Derivative of the barrier function, `2 / (1 - xi^2)`.
pub fn barrier_deriv(xi: f64) -> f64 {
    2.0 / (1.0 - xi * xi)
}

/// Normalise `error` by the envelope diagonal `rho` and apply the barrier.
pub fn transform(
    error: &Vector3<f64>,
    rho: &Vector3<f64>,
    limits: &BarrierLimits,
) -> BarrierOutput {
    let xi = error.component_div(rho);
    let xi_clamped = xi.map(|v| sym_clamp(v, limits.clamp));

    BarrierOutput {
        xi,
        eps: xi_clamped.map(barrier),
        r: xi_clamped.map(barrier_deriv),
        warn: !xi.iter().all(|v| v.is_finite()) || max_abs_vec3(&xi) > limits.warn,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_half_envelope() {
        let out = transform(
            &Vector3::new(0.05, 0.0, 0.0),
            &Vector3::new(0.1, 0.1, 1.0),
            &BarrierLimits::POSITION,
        );

        assert_relative_eq!(out.xi[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(out.eps[0], 3f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(out.r[0], 2.0 / 0.75, epsilon = 1e-12);
        assert_eq!(out.eps[1], 0.0);
        assert_eq!(out.r[1], 2.0);
        assert!(!out.warn);
    }

    #[test]
    fn test_saturation() {
        let out = transform(
            &Vector3::new(0.0, -0.5, 0.0),
            &Vector3::new(0.1, 0.1, 1.0),
            &BarrierLimits::POSITION,
        );

        assert_relative_eq!(out.xi[1], -5.0, epsilon = 1e-12);
        assert_relative_eq!(out.eps[1], barrier(-0.9999));
        assert!(out.eps[1].is_finite());
        assert!(out.r[1].is_finite());
        assert!(out.warn);
    }

    #[test]
    fn test_odd_and_even() {
        let limits = BarrierLimits::VELOCITY;
        let rho = Vector3::new(30.0, 30.0, 50.0);
        let pos = transform(&Vector3::new(3.0, 12.0, 40.0), &rho, &limits);
        let neg = transform(&Vector3::new(-3.0, -12.0, -40.0), &rho, &limits);

        assert_relative_eq!(pos.eps, -neg.eps);
        assert_relative_eq!(pos.r, neg.r);
    }

    #[test]
    fn test_warn_band() {
        let rho = Vector3::new(1.0, 1.0, 1.0);
        let limits = BarrierLimits::VELOCITY;

        assert!(!transform(&Vector3::new(0.979, 0.0, 0.0), &rho, &limits).warn);
        assert!(transform(&Vector3::new(0.0, 0.0, -0.985), &rho, &limits).warn);
        assert!(transform(&Vector3::new(std::f64::NAN, 0.0, 0.0), &rho, &limits).warn);
    }

    #[test]
    fn test_scaled() {
        let rho = Vector3::new(0.1, 0.1, 1.0);
        let out = transform(&Vector3::new(0.05, 0.0, 0.0), &rho, &BarrierLimits::POSITION);

        assert_relative_eq!(
            out.scaled(&rho)[0],
            3f64.ln() * (2.0 / 0.75) / 0.1,
            epsilon = 1e-9
        );
        assert!(BarrierLimits::POSITION.validate().is_ok());
        assert!(BarrierLimits { clamp: 1.0, warn: 0.9 }.validate().is_err());
    }

    #[test]
    fn test_limits_validation() {
        assert!(BarrierLimits::VELOCITY.validate().is_ok());
        assert!(BarrierLimits { clamp: 0.99, warn: 0.99 }.validate().is_err());
        assert!(BarrierLimits { clamp: 0.99, warn: 0.995 }.validate().is_err());
        assert!(BarrierLimits { clamp: 0.99, warn: 0.0 }.validate().is_err());
    }

    #[test]
    fn test_strictly_increasing() {
        let n = 20_000;
        let lo = -0.9999;
        let h = 2.0 * 0.9999 / n as f64;

        let mut prev = barrier(lo);
        for i in 1..=n {
            let x = lo + i as f64 * h;
            let next = barrier(x);
            assert!(next > prev, "not increasing at xi = {}", x);
            prev = next;
        }
    }

    #[test]
    fn test_nan_is_not_clamped() {
        let out = transform(
            &Vector3::new(std::f64::NAN, 0.02, 0.0),
            &Vector3::new(30.0, 30.0, 50.0),
            &BarrierLimits::VELOCITY,
        );

        assert!(out.warn);
        assert!(out.eps[0].is_nan());
        assert!(out.r[0].is_nan());
        assert!(out.scaled(&Vector3::new(30.0, 30.0, 50.0))[0].is_nan());
        assert!(out.eps[1].is_finite());
    }
}
