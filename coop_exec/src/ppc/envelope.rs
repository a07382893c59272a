//! Exponentially decaying performance envelopes

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Envelope of a single axis, `rho(t) = (rho_0 - rho_inf) e^(-lambda t) + rho_inf`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeAxis {
    /// Initial bound.
    pub rho_0: f64,

    /// Steady state bound.
    pub rho_inf: f64,

    /// Decay rate.
    ///
    /// Units: 1/seconds
    pub lambda: f64,
}

/// Envelopes of the `x`, `y` and orientation axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub x: EnvelopeAxis,
    pub y: EnvelopeAxis,
    pub theta: EnvelopeAxis,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EnvelopeAxis {
    pub const fn new(rho_0: f64, rho_inf: f64, lambda: f64) -> Self {
        Self {
            rho_0,
            rho_inf,
            lambda,
        }
    }

    /// Evaluate the envelope `time_s` seconds after its epoch.
    ///
    /// Negative times are treated as the epoch so the bound never exceeds
    /// `rho_0`.
    pub fn eval(&self, time_s: f64) -> f64 {
        (self.rho_0 - self.rho_inf) * (-self.lambda * time_s.max(0.0)).exp() + self.rho_inf
    }

    /// Check the axis parameters, returning a description of the first
    /// problem found.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.rho_inf > 0.0) {
            return Err(format!("rho_inf must be positive, got {}", self.rho_inf));
        }
        if !(self.rho_0 > self.rho_inf) {
            return Err(format!(
                "rho_0 ({}) must be greater than rho_inf ({})",
                self.rho_0, self.rho_inf
            ));
        }
        if !(self.lambda > 0.0) {
            return Err(format!("lambda must be positive, got {}", self.lambda));
        }

        Ok(())
    }
}

impl Envelope {
    /// Default object position envelope.
    pub fn default_position() -> Self {
        Self {
            x: EnvelopeAxis::new(0.1, 0.02, 0.5),
            y: EnvelopeAxis::new(0.1, 0.02, 0.5),
            theta: EnvelopeAxis::new(1.0, 0.1, 0.5),
        }
    }

    /// Default object velocity envelope.
    pub fn default_velocity() -> Self {
        Self {
            x: EnvelopeAxis::new(30.0, 22.0, 0.1),
            y: EnvelopeAxis::new(30.0, 22.0, 0.1),
            theta: EnvelopeAxis::new(50.0, 30.0, 0.1),
        }
    }

    /// Diagonal of the envelope matrix at `time_s`.
    pub fn eval(&self, time_s: f64) -> Vector3<f64> {
        Vector3::new(
            self.x.eval(time_s),
            self.y.eval(time_s),
            self.theta.eval(time_s),
        )
    }

    /// Envelope matrix at `time_s`.
    pub fn eval_matrix(&self, time_s: f64) -> Matrix3<f64> {
        Matrix3::from_diagonal(&self.eval(time_s))
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, axis) in [("x", &self.x), ("y", &self.y), ("theta", &self.theta)].iter() {
            axis.validate().map_err(|e| format!("{} axis: {}", name, e))?;
        }

        Ok(())
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
    fn test_endpoints() {
        let env = Envelope::default_position();

        assert_relative_eq!(env.eval(0.0), Vector3::new(0.1, 0.1, 1.0));
        assert_relative_eq!(env.eval(1e3), Vector3::new(0.02, 0.02, 0.1));
        assert_relative_eq!(env.eval(-5.0), env.eval(0.0));
    }

    #[test]
    fn test_monotone_decay() {
        let env = Envelope::default_velocity();
        let mut prev = env.eval(0.0);

        for i in 1..200 {
            let rho = env.eval(i as f64 * 0.25);
            for a in 0..3 {
                assert!(rho[a] <= prev[a]);
                assert!(rho[a] > 0.0);
            }
            prev = rho;
        }
    }

    #[test]
    fn test_half_life() {
        let axis = EnvelopeAxis::new(0.1, 0.02, 0.5);
        let t_half = 2f64.ln() / 0.5;

        assert_relative_eq!(axis.eval(t_half), 0.06, epsilon = 1e-12);
    }

    #[test]
    fn test_validate() {
        assert!(Envelope::default_position().validate().is_ok());
        assert!(EnvelopeAxis::new(0.02, 0.1, 0.5).validate().is_err());
        assert!(EnvelopeAxis::new(0.1, 0.0, 0.5).validate().is_err());
        assert!(EnvelopeAxis::new(0.1, 0.02, -1.0).validate().is_err());
        assert!(EnvelopeAxis::new(0.1, 0.02, std::f64::NAN).validate().is_err());
    }
}
