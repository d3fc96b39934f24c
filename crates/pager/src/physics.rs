//! Scroll physics: how user drags, boundaries, and flings turn into motion.
//!
//! Physics compose as a chain. Each implementation handles what it cares about
//! and forwards everything else to its parent, falling back to a plain
//! unbounded policy at the root.

use std::fmt;

use crate::metrics::PageMetrics;
use crate::simulation::{
    BoundedFrictionSimulation, BouncingScrollSimulation, ScrollSpringSimulation, Simulation,
    SpringDescription, Tolerance,
};

pub trait ScrollPhysics: fmt::Debug {
    fn parent(&self) -> Option<&dyn ScrollPhysics>;

    fn tolerance(&self) -> Tolerance {
        self.parent()
            .map_or_else(|| Tolerance::for_pixel_ratio(1.0), |parent| parent.tolerance())
    }

    fn spring(&self) -> SpringDescription {
        self.parent().map_or_else(default_spring, |parent| parent.spring())
    }

    /// Adjusts a raw drag delta, e.g. adding resistance past an edge.
    fn apply_physics_to_user_offset(&self, metrics: &PageMetrics, offset: f64) -> f64 {
        self.parent().map_or(offset, |parent| {
            parent.apply_physics_to_user_offset(metrics, offset)
        })
    }

    fn should_accept_user_offset(&self, metrics: &PageMetrics) -> bool {
        self.parent().map_or_else(
            || metrics.min_scroll_extent != metrics.max_scroll_extent,
            |parent| parent.should_accept_user_offset(metrics),
        )
    }

    /// Portion of a proposed move to `value` that must be rejected as
    /// overscroll. Zero accepts the whole move.
    fn apply_boundary_conditions(&self, metrics: &PageMetrics, value: f64) -> f64 {
        self.parent().map_or(0.0, |parent| {
            parent.apply_boundary_conditions(metrics, value)
        })
    }

    /// Motion to run after a release at `velocity` (pixels per second, in the
    /// direction of increasing offset). `None` means stay put.
    fn create_ballistic_simulation(
        &self,
        metrics: &PageMetrics,
        velocity: f64,
    ) -> Option<Box<dyn Simulation>> {
        self.parent()
            .and_then(|parent| parent.create_ballistic_simulation(metrics, velocity))
    }
}

fn default_spring() -> SpringDescription {
    SpringDescription::with_damping_ratio(0.5, 100.0, 1.1)
}

/// Hard edges: overscroll is refused and flings stop at the extents.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClampingScrollPhysics;

impl ClampingScrollPhysics {
    pub const FRICTION_DRAG: f64 = 0.135;
}

impl ScrollPhysics for ClampingScrollPhysics {
    fn parent(&self) -> Option<&dyn ScrollPhysics> {
        None
    }

    fn apply_boundary_conditions(&self, metrics: &PageMetrics, value: f64) -> f64 {
        let (pixels, min, max) = (
            metrics.pixels,
            metrics.min_scroll_extent,
            metrics.max_scroll_extent,
        );
        if value < pixels && pixels <= min {
            return value - pixels;
        }
        if max <= pixels && pixels < value {
            return value - pixels;
        }
        if value < min && min < pixels {
            return value - min;
        }
        if pixels < max && max < value {
            return value - max;
        }
        0.0
    }

    fn create_ballistic_simulation(
        &self,
        metrics: &PageMetrics,
        velocity: f64,
    ) -> Option<Box<dyn Simulation>> {
        let tolerance = self.tolerance();
        let (pixels, min, max) = (
            metrics.pixels,
            metrics.min_scroll_extent,
            metrics.max_scroll_extent,
        );
        if metrics.out_of_range() {
            let (end, velocity) = if pixels > max {
                (max, velocity.min(0.0))
            } else {
                (min, velocity.max(0.0))
            };
            return Some(Box::new(ScrollSpringSimulation::new(
                self.spring(),
                pixels,
                end,
                velocity,
                tolerance,
            )));
        }
        if velocity.abs() < tolerance.velocity
            || (velocity > 0.0 && pixels >= max)
            || (velocity < 0.0 && pixels <= min)
        {
            return None;
        }
        Some(Box::new(BoundedFrictionSimulation::new(
            Self::FRICTION_DRAG,
            pixels,
            velocity,
            min,
            max,
            tolerance,
        )))
    }
}

/// Soft edges: dragging past an extent meets growing resistance and the
/// content springs back on release.
#[derive(Debug, Default, Clone, Copy)]
pub struct BouncingScrollPhysics;

impl BouncingScrollPhysics {
    fn friction_factor(overscroll_fraction: f64) -> f64 {
        0.52 * (1.0 - overscroll_fraction).powi(2)
    }

    fn apply_friction(extent_outside: f64, delta: f64, gamma: f64) -> f64 {
        let mut total = 0.0;
        let mut delta = delta;
        if extent_outside > 0.0 {
            let delta_to_limit = extent_outside / gamma;
            if delta < delta_to_limit {
                return delta * gamma;
            }
            total += extent_outside;
            delta -= delta_to_limit;
        }
        total + delta
    }
}

impl ScrollPhysics for BouncingScrollPhysics {
    fn parent(&self) -> Option<&dyn ScrollPhysics> {
        None
    }

    fn apply_physics_to_user_offset(&self, metrics: &PageMetrics, offset: f64) -> f64 {
        if !metrics.out_of_range() {
            return offset;
        }
        let past_start = (metrics.min_scroll_extent - metrics.pixels).max(0.0);
        let past_end = (metrics.pixels - metrics.max_scroll_extent).max(0.0);
        let past = past_start.max(past_end);
        let easing = (past_start > 0.0 && offset < 0.0) || (past_end > 0.0 && offset > 0.0);
        let viewport = metrics.viewport_dimension.max(1.0);
        let friction = if easing {
            Self::friction_factor((past - offset.abs()) / viewport)
        } else {
            Self::friction_factor(past / viewport)
        };
        offset.signum() * Self::apply_friction(past, offset.abs(), friction)
    }

    fn create_ballistic_simulation(
        &self,
        metrics: &PageMetrics,
        velocity: f64,
    ) -> Option<Box<dyn Simulation>> {
        let tolerance = self.tolerance();
        if velocity.abs() < tolerance.velocity && !metrics.out_of_range() {
            return None;
        }
        Some(Box::new(BouncingScrollSimulation::new(
            self.spring(),
            metrics.pixels,
            velocity * 0.91,
            metrics.min_scroll_extent,
            metrics.max_scroll_extent,
            tolerance,
        )))
    }
}

/// Settles every fling on a whole page.
#[derive(Debug, Default)]
pub struct PageScrollPhysics {
    parent: Option<Box<dyn ScrollPhysics>>,
}

impl PageScrollPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page snapping layered over `parent`, which keeps handling edges and
    /// drag resistance.
    pub fn apply_to(parent: Box<dyn ScrollPhysics>) -> Self {
        Self {
            parent: Some(parent),
        }
    }

    /// Pixel offset a release at `velocity` should come to rest on. Outside
    /// the tolerance band the page is biased half a page in the direction of
    /// motion, so any deliberate fling advances at least one page. The result
    /// never leaves the scroll extents.
    pub fn target_pixels(&self, metrics: &PageMetrics, velocity: f64) -> f64 {
        let tolerance = self.tolerance();
        let page = metrics.page();
        // Ties resolve in the direction of motion.
        let target = if velocity < -tolerance.velocity {
            (page - 1.0).ceil()
        } else if velocity > tolerance.velocity {
            (page + 0.5).round()
        } else {
            page.round()
        };
        metrics
            .pixels_from_page(target.max(0.0))
            .clamp(metrics.min_scroll_extent, metrics.max_scroll_extent)
    }
}

impl ScrollPhysics for PageScrollPhysics {
    fn parent(&self) -> Option<&dyn ScrollPhysics> {
        self.parent.as_deref()
    }

    fn create_ballistic_simulation(
        &self,
        metrics: &PageMetrics,
        velocity: f64,
    ) -> Option<Box<dyn Simulation>> {
        if (velocity <= 0.0 && metrics.pixels <= metrics.min_scroll_extent)
            || (velocity >= 0.0 && metrics.pixels >= metrics.max_scroll_extent)
        {
            return self
                .parent()
                .and_then(|parent| parent.create_ballistic_simulation(metrics, velocity));
        }

        let target = self.target_pixels(metrics, velocity);
        if target == metrics.pixels {
            return None;
        }
        log::trace!(
            "page snap from {} to {target} at {velocity} px/s",
            metrics.pixels
        );
        Some(Box::new(ScrollSpringSimulation::new(
            self.spring(),
            metrics.pixels,
            target,
            velocity,
            self.tolerance(),
        )))
    }
}
