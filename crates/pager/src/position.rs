//! Scroll offset state machine that measures itself in pages.

use std::rc::Rc;
use std::time::Duration;

use strum::IntoStaticStr;

use crate::animation::{AnimationCompleter, AnimationHandle, AnimationOutcome, animation_channel};
use crate::curve::Curve;
use crate::metrics::{self, PageMetrics, ScrollMetrics};
use crate::notification::ScrollNotification;
use crate::physics::ScrollPhysics;
use crate::simulation::Simulation;

const PRECISION_ERROR_TOLERANCE: f64 = 1e-10;

/// Scroll offset, unknown until the first viewport dimension arrives.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Pixels {
    #[default]
    Uninitialized,
    At(f64),
}

impl Pixels {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Uninitialized => None,
            Self::At(pixels) => Some(pixels),
        }
    }
}

#[derive(Debug)]
struct DrivenAnimation {
    from: f64,
    to: f64,
    duration: Duration,
    curve: Curve,
    started: Option<Duration>,
    last: Option<(Duration, f64)>,
    velocity: f64,
    completer: AnimationCompleter,
}

impl DrivenAnimation {
    /// Value at frame time `now` and whether the animation reached its end.
    fn sample(&mut self, now: Duration) -> (f64, bool) {
        let started = *self.started.get_or_insert(now);
        let elapsed = now.saturating_sub(started);
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        };
        let done = progress >= 1.0;
        let value = if done {
            self.to
        } else {
            self.from + (self.to - self.from) * self.curve.transform(progress)
        };

        if let Some((time, previous)) = self.last {
            let dt = now.saturating_sub(time).as_secs_f64();
            if dt > 0.0 {
                self.velocity = (value - previous) / dt;
            }
        }
        self.last = Some((now, value));
        (value, done)
    }
}

/// What currently moves the position.
#[derive(Debug, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
enum Activity {
    Idle,
    Drag,
    Ballistic {
        simulation: Box<dyn Simulation>,
        started: Option<Duration>,
        velocity: f64,
    },
    Animate(DrivenAnimation),
}

impl Activity {
    fn is_scrolling(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    fn velocity(&self) -> f64 {
        match self {
            Self::Ballistic { velocity, .. } => *velocity,
            Self::Animate(animation) => animation.velocity,
            Self::Idle | Self::Drag => 0.0,
        }
    }
}

#[derive(Debug)]
pub struct PagePosition {
    physics: Rc<dyn ScrollPhysics>,
    pixels: Pixels,
    viewport_dimension: Option<f64>,
    content_extents: Option<(f64, f64)>,
    viewport_fraction: f64,
    initial_page: f64,
    activity: Activity,
    notifications: Vec<ScrollNotification>,
}

impl PagePosition {
    pub fn new(physics: Rc<dyn ScrollPhysics>, initial_page: f64, viewport_fraction: f64) -> Self {
        assert!(
            viewport_fraction > 0.0,
            "viewport fraction must be positive, got {viewport_fraction}"
        );
        Self {
            physics,
            pixels: Pixels::Uninitialized,
            viewport_dimension: None,
            content_extents: None,
            viewport_fraction,
            initial_page,
            activity: Activity::Idle,
            notifications: Vec::new(),
        }
    }

    pub fn physics(&self) -> &dyn ScrollPhysics {
        self.physics.as_ref()
    }

    pub fn pixels(&self) -> Pixels {
        self.pixels
    }

    pub fn initial_page(&self) -> f64 {
        self.initial_page
    }

    pub fn viewport_dimension(&self) -> Option<f64> {
        self.viewport_dimension
    }

    pub fn viewport_fraction(&self) -> f64 {
        self.viewport_fraction
    }

    /// Snapshot of the scroll state, once pixels, viewport and content extents
    /// are all known.
    pub fn metrics(&self) -> Option<PageMetrics> {
        let pixels = self.pixels.value()?;
        let viewport_dimension = self.viewport_dimension?;
        let (min_scroll_extent, max_scroll_extent) = self.content_extents?;
        Some(PageMetrics::new(
            ScrollMetrics {
                pixels,
                min_scroll_extent,
                max_scroll_extent,
                viewport_dimension,
            },
            self.viewport_fraction,
        ))
    }

    fn expect_metrics(&self) -> PageMetrics {
        match self.metrics() {
            Some(metrics) => metrics,
            None => panic!("page position used before its first layout"),
        }
    }

    pub fn page_from_pixels(&self, pixels: f64, viewport_dimension: f64) -> f64 {
        metrics::page_from_pixels(pixels, viewport_dimension, self.viewport_fraction)
    }

    pub fn pixels_from_page(&self, page: f64) -> f64 {
        metrics::pixels_from_page(
            page,
            self.viewport_dimension.unwrap_or(0.0),
            self.viewport_fraction,
        )
    }

    /// Current fractional page.
    pub fn page(&self) -> Option<f64> {
        self.metrics().map(|metrics| metrics.page())
    }

    /// Changes the page size while staying on the same page.
    pub fn set_viewport_fraction(&mut self, viewport_fraction: f64) {
        assert!(
            viewport_fraction > 0.0,
            "viewport fraction must be positive, got {viewport_fraction}"
        );
        if self.viewport_fraction == viewport_fraction {
            return;
        }
        let old_page = self.page();
        self.viewport_fraction = viewport_fraction;
        if let Some(page) = old_page {
            self.correct_pixels(self.pixels_from_page(page));
        }
    }

    /// Accepts a new viewport size, keeping the current page in view. Returns
    /// `false` when pixels had to be corrected, so the caller lays out again.
    pub fn apply_viewport_dimension(&mut self, viewport_dimension: f64) -> bool {
        let old_dimension = self.viewport_dimension;
        if old_dimension == Some(viewport_dimension) {
            return true;
        }
        self.viewport_dimension = Some(viewport_dimension);

        let old_pixels = self.pixels.value();
        let page = match (old_pixels, old_dimension) {
            (Some(pixels), Some(dimension)) if dimension != 0.0 => {
                self.page_from_pixels(pixels, dimension)
            }
            _ => self.initial_page,
        };
        let new_pixels = self.pixels_from_page(page);
        if Some(new_pixels) != old_pixels {
            log::debug!(
                "viewport {old_dimension:?} -> {viewport_dimension}, holding page {page} at {new_pixels}px"
            );
            self.correct_pixels(new_pixels);
            return false;
        }
        true
    }

    /// Accepts new scroll extents. Idle or coasting positions re-run their
    /// ballistic policy so they settle inside the new range. New extents never
    /// correct pixels, so this always reports the layout as settled.
    pub fn apply_content_dimensions(&mut self, min_scroll_extent: f64, max_scroll_extent: f64) -> bool {
        assert!(
            min_scroll_extent <= max_scroll_extent,
            "inverted scroll extents {min_scroll_extent}..{max_scroll_extent}"
        );
        let extents = Some((min_scroll_extent, max_scroll_extent));
        if self.content_extents != extents {
            self.content_extents = extents;
            if self.pixels.value().is_some() && self.viewport_dimension.is_some() {
                self.apply_new_dimensions();
            }
        }
        true
    }

    fn apply_new_dimensions(&mut self) {
        match self.activity {
            Activity::Idle => self.go_ballistic(0.0),
            Activity::Ballistic { velocity, .. } => self.go_ballistic(velocity),
            Activity::Drag | Activity::Animate(_) => {}
        }
    }

    /// Moves without notifying anyone; used while laying out.
    pub fn correct_pixels(&mut self, value: f64) {
        self.pixels = Pixels::At(value);
    }

    pub fn correct_by(&mut self, correction: f64) {
        match self.pixels {
            Pixels::At(pixels) => self.pixels = Pixels::At(pixels + correction),
            Pixels::Uninitialized => panic!("cannot correct uninitialized pixels"),
        }
    }

    /// Moves towards `value` as far as the physics allow, returning the
    /// refused overscroll.
    pub fn set_pixels(&mut self, value: f64) -> f64 {
        let metrics = self.expect_metrics();
        if value == metrics.pixels {
            return 0.0;
        }
        let overscroll = self.physics.apply_boundary_conditions(&metrics, value);
        let pixels = value - overscroll;
        self.pixels = Pixels::At(pixels);
        if pixels != metrics.pixels {
            let delta = pixels - metrics.pixels;
            self.notify(|metrics| ScrollNotification::Update { metrics, delta });
        }
        if overscroll != 0.0 {
            let velocity = self.activity.velocity();
            self.notify(|metrics| ScrollNotification::Overscroll {
                metrics,
                overscroll,
                velocity,
            });
        }
        overscroll
    }

    /// Moves to `value` immediately and settles there.
    pub fn jump_to(&mut self, value: f64) {
        self.go_idle();
        let old_pixels = self.expect_metrics().pixels;
        if old_pixels != value {
            self.pixels = Pixels::At(value);
            self.notify(ScrollNotification::Start);
            self.notify(|metrics| ScrollNotification::Update {
                metrics,
                delta: value - old_pixels,
            });
            self.notify(ScrollNotification::End);
        }
        self.go_ballistic(0.0);
    }

    /// Starts driving pixels to `to` over `duration`, advanced by `tick`.
    pub fn animate_to(&mut self, to: f64, duration: Duration, curve: Curve) -> AnimationHandle {
        let from = self.expect_metrics().pixels;
        if (to - from).abs() < self.physics.tolerance().distance || duration.is_zero() {
            self.jump_to(to);
            return AnimationHandle::completed(AnimationOutcome::Completed);
        }
        let (completer, handle) = animation_channel();
        self.begin_activity(Activity::Animate(DrivenAnimation {
            from,
            to,
            duration,
            curve,
            started: None,
            last: None,
            velocity: 0.0,
            completer,
        }));
        handle
    }

    /// Hands the position to the user's finger, cancelling any animation.
    pub fn begin_drag(&mut self) {
        self.begin_activity(Activity::Drag);
    }

    /// Applies a drag delta along the scroll axis. Positive deltas move the
    /// content forward, towards smaller offsets.
    pub fn apply_user_offset(&mut self, delta: f64) {
        let metrics = self.expect_metrics();
        if delta == 0.0 || !self.physics.should_accept_user_offset(&metrics) {
            return;
        }
        if !matches!(self.activity, Activity::Drag) {
            self.begin_drag();
        }
        let offset = self.physics.apply_physics_to_user_offset(&metrics, delta);
        self.set_pixels(metrics.pixels - offset);
    }

    /// Releases a drag moving at `velocity` in the same sense as the deltas.
    pub fn end_drag(&mut self, velocity: f64) {
        self.go_ballistic(-velocity);
    }

    /// Lets the physics decide how to settle from `velocity` (in offset units
    /// per second).
    pub fn go_ballistic(&mut self, velocity: f64) {
        let metrics = self.expect_metrics();
        match self.physics.create_ballistic_simulation(&metrics, velocity) {
            Some(simulation) => self.begin_activity(Activity::Ballistic {
                simulation,
                started: None,
                velocity,
            }),
            None => self.go_idle(),
        }
    }

    pub fn go_idle(&mut self) {
        self.begin_activity(Activity::Idle);
    }

    pub fn is_scrolling(&self) -> bool {
        self.activity.is_scrolling()
    }

    /// Whether frames are needed to make progress.
    pub fn is_animating(&self) -> bool {
        matches!(
            self.activity,
            Activity::Ballistic { .. } | Activity::Animate(_)
        )
    }

    /// Advances the running simulation or animation to frame time `now`.
    /// Returns whether another frame is needed.
    pub fn tick(&mut self, now: Duration) -> bool {
        match &mut self.activity {
            Activity::Ballistic {
                simulation,
                started,
                velocity,
            } => {
                let t = now.saturating_sub(*started.get_or_insert(now)).as_secs_f64();
                let value = simulation.x(t);
                *velocity = simulation.dx(t);
                let done = simulation.is_done(t);
                if self.set_pixels(value).abs() > PRECISION_ERROR_TOLERANCE {
                    self.go_idle();
                } else if done {
                    self.go_ballistic(0.0);
                }
            }
            Activity::Animate(animation) => {
                let (value, done) = animation.sample(now);
                if self.set_pixels(value) != 0.0 {
                    self.complete_animation();
                    self.go_idle();
                } else if done {
                    self.complete_animation();
                    self.go_ballistic(0.0);
                }
            }
            Activity::Idle | Activity::Drag => {}
        }
        self.is_animating()
    }

    fn complete_animation(&mut self) {
        if let Activity::Animate(animation) = &mut self.activity {
            animation.completer.complete();
        }
    }

    fn begin_activity(&mut self, activity: Activity) {
        let was_scrolling = self.activity.is_scrolling();
        let is_scrolling = activity.is_scrolling();
        let previous = std::mem::replace(&mut self.activity, activity);
        log::trace!(
            "page position {} -> {}",
            <&str>::from(&previous),
            <&str>::from(&self.activity)
        );
        // Dropping an unfinished animation cancels its handle.
        drop(previous);

        if was_scrolling && !is_scrolling {
            self.notify(ScrollNotification::End);
        }
        if !was_scrolling && is_scrolling {
            self.notify(ScrollNotification::Start);
        }
    }

    fn notify(&mut self, build: impl FnOnce(PageMetrics) -> ScrollNotification) {
        if let Some(metrics) = self.metrics() {
            self.notifications.push(build(metrics));
        }
    }

    /// Drains the notifications queued since the last call.
    pub fn take_notifications(&mut self) -> Vec<ScrollNotification> {
        std::mem::take(&mut self.notifications)
    }
}
