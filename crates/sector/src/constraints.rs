use crate::TWO_PI;
use std::fmt;

/// Valid ranges for a sector's radial thickness and angular sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorConstraints {
    pub min_delta_radius: f64,
    pub max_delta_radius: f64,
    pub min_delta_theta: f64,
    pub max_delta_theta: f64,
}

impl Default for SectorConstraints {
    fn default() -> Self {
        Self {
            min_delta_radius: 0.0,
            max_delta_radius: f64::INFINITY,
            min_delta_theta: 0.0,
            max_delta_theta: TWO_PI,
        }
    }
}

impl SectorConstraints {
    pub fn tight(delta_radius: f64, delta_theta: f64) -> Self {
        Self {
            min_delta_radius: delta_radius,
            max_delta_radius: delta_radius,
            min_delta_theta: delta_theta,
            max_delta_theta: delta_theta,
        }
    }

    pub fn with_max(max_delta_radius: f64, max_delta_theta: f64) -> Self {
        Self {
            max_delta_radius,
            max_delta_theta,
            ..Self::default()
        }
    }

    pub fn constrain_delta_radius(&self, delta_radius: f64) -> f64 {
        delta_radius.clamp(self.min_delta_radius, self.max_delta_radius)
    }

    pub fn constrain_delta_theta(&self, delta_theta: f64) -> f64 {
        delta_theta.clamp(self.min_delta_theta, self.max_delta_theta)
    }

    /// Only the angular bound is consulted; a radially loose constraint with a
    /// collapsed angle still counts as tight.
    pub fn is_tight(&self) -> bool {
        self.min_delta_theta >= self.max_delta_theta
    }

    pub fn is_normalized(&self) -> bool {
        self.min_delta_radius <= self.max_delta_radius
            && self.min_delta_theta <= self.max_delta_theta
    }

    pub fn debug_assert_is_valid(&self) {
        assert!(
            self.is_normalized(),
            "sector constraints are not normalized: {self}"
        );
    }
}

impl fmt::Display for SectorConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SectorConstraints(dR: {:.3}..{:.3}, dθ: {:.3}..{:.3})",
            self.min_delta_radius, self.max_delta_radius, self.min_delta_theta, self.max_delta_theta
        )
    }
}

/// A resolved (delta radius, delta theta) pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SectorDimensions {
    pub delta_radius: f64,
    pub delta_theta: f64,
}

impl SectorDimensions {
    pub fn new(delta_radius: f64, delta_theta: f64) -> Self {
        Self {
            delta_radius,
            delta_theta,
        }
    }

    pub fn with_constraints(
        constraints: &SectorConstraints,
        delta_radius: f64,
        delta_theta: f64,
    ) -> Self {
        Self {
            delta_radius: constraints.constrain_delta_radius(delta_radius),
            delta_theta: constraints.constrain_delta_theta(delta_theta),
        }
    }

    /// The smallest size the constraints allow.
    pub fn min_of(constraints: &SectorConstraints) -> Self {
        Self::with_constraints(constraints, 0.0, 0.0)
    }
}
