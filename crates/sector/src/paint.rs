use crate::geometry::Point;
use cairo::Context;
use palette::Srgba;

/// Visual fill of a sector. A sector without a color paints nothing itself.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Decoration {
    pub color: Option<Srgba<f64>>,
}

impl Decoration {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn color(color: Srgba<f64>) -> Self {
        Self { color: Some(color) }
    }
}

/// Annulus wedge around `center`, from `theta` sweeping `delta_theta`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wedge {
    pub radius: f64,
    pub delta_radius: f64,
    pub theta: f64,
    pub delta_theta: f64,
}

impl Wedge {
    pub fn fill(&self, cr: &Context, center: Point, color: Srgba<f64>) -> Result<(), cairo::Error> {
        let outer_radius = self.radius + self.delta_radius;
        let end = self.theta + self.delta_theta;
        let (r, g, b, a) = color.into_components();

        cr.new_path();
        cr.set_source_rgba(r, g, b, a);
        cr.arc(center.x, center.y, outer_radius, self.theta, end);
        cr.arc_negative(center.x, center.y, self.radius, end, self.theta);
        cr.close_path();
        cr.fill()
    }
}
