use crate::TWO_PI;
use crate::constraints::{SectorConstraints, SectorDimensions};
use crate::hit_test::PointerEvent;
use crate::paint::Decoration;
use palette::Srgba;

pub fn default_highlight() -> Srgba<f64> {
    Srgba::new(1.0, 0.0, 0.0, 1.0)
}

/// Leaf sector filled with a single color that lights up while pressed.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidColor {
    pub background: Srgba<f64>,
    pub highlight: Srgba<f64>,
    pub desired_delta_radius: f64,
    pub desired_delta_theta: f64,
}

impl SolidColor {
    pub fn new(background: Srgba<f64>) -> Self {
        Self {
            background,
            highlight: default_highlight(),
            desired_delta_radius: f64::INFINITY,
            desired_delta_theta: TWO_PI,
        }
    }

    pub(crate) fn intrinsic_dimensions(&self, constraints: &SectorConstraints) -> SectorDimensions {
        SectorDimensions::with_constraints(
            constraints,
            self.desired_delta_radius,
            self.desired_delta_theta,
        )
    }

    pub(crate) fn perform_layout(&self, constraints: &SectorConstraints) -> SectorDimensions {
        SectorDimensions::with_constraints(
            constraints,
            self.desired_delta_radius,
            self.desired_delta_theta,
        )
    }

    /// Decoration to show after `event`.
    pub(crate) fn decoration_for(&self, event: PointerEvent) -> Decoration {
        match event {
            PointerEvent::Down => Decoration::color(self.highlight),
            PointerEvent::Up => Decoration::color(self.background),
        }
    }
}
