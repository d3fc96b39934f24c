//! Closed-form motion models driven by elapsed time in seconds.

use std::fmt;

/// How close is close enough for a simulation to be considered settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub distance: f64,
    pub time: f64,
    pub velocity: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            distance: 1e-3,
            time: 1e-3,
            velocity: 1e-3,
        }
    }
}

impl Tolerance {
    /// Scroll tolerance for a display with `device_pixel_ratio` physical pixels
    /// per logical pixel.
    pub fn for_pixel_ratio(device_pixel_ratio: f64) -> Self {
        Self {
            distance: 1.0 / device_pixel_ratio,
            time: 1e-3,
            velocity: 1.0 / (0.050 * device_pixel_ratio),
        }
    }
}

fn near_zero(value: f64, epsilon: f64) -> bool {
    value.abs() <= epsilon
}

pub trait Simulation: fmt::Debug {
    /// Position at `time` seconds after the start.
    fn x(&self, time: f64) -> f64;
    /// Velocity at `time`.
    fn dx(&self, time: f64) -> f64;
    fn is_done(&self, time: f64) -> bool;
    fn tolerance(&self) -> Tolerance;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringDescription {
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
}

impl SpringDescription {
    pub fn new(mass: f64, stiffness: f64, damping: f64) -> Self {
        Self {
            mass,
            stiffness,
            damping,
        }
    }

    /// `ratio` 1.0 is critically damped, below bounces, above creeps.
    pub fn with_damping_ratio(mass: f64, stiffness: f64, ratio: f64) -> Self {
        Self::new(mass, stiffness, ratio * 2.0 * (mass * stiffness).sqrt())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SpringSolution {
    Critical { r: f64, c1: f64, c2: f64 },
    Overdamped { r1: f64, r2: f64, c1: f64, c2: f64 },
    Underdamped { w: f64, r: f64, c1: f64, c2: f64 },
}

impl SpringSolution {
    fn new(spring: SpringDescription, distance: f64, velocity: f64) -> Self {
        let SpringDescription {
            mass,
            stiffness,
            damping,
        } = spring;
        let cmk = damping * damping - 4.0 * mass * stiffness;

        if cmk == 0.0 {
            let r = -damping / (2.0 * mass);
            Self::Critical {
                r,
                c1: distance,
                c2: velocity - r * distance,
            }
        } else if cmk > 0.0 {
            let r1 = (-damping - cmk.sqrt()) / (2.0 * mass);
            let r2 = (-damping + cmk.sqrt()) / (2.0 * mass);
            let c2 = (velocity - r1 * distance) / (r2 - r1);
            Self::Overdamped {
                r1,
                r2,
                c1: distance - c2,
                c2,
            }
        } else {
            let w = (4.0 * mass * stiffness - damping * damping).sqrt() / (2.0 * mass);
            let r = -damping / (2.0 * mass);
            Self::Underdamped {
                w,
                r,
                c1: distance,
                c2: (velocity - r * distance) / w,
            }
        }
    }

    fn x(&self, t: f64) -> f64 {
        match *self {
            Self::Critical { r, c1, c2 } => (c1 + c2 * t) * (r * t).exp(),
            Self::Overdamped { r1, r2, c1, c2 } => c1 * (r1 * t).exp() + c2 * (r2 * t).exp(),
            Self::Underdamped { w, r, c1, c2 } => {
                (r * t).exp() * (c1 * (w * t).cos() + c2 * (w * t).sin())
            }
        }
    }

    fn dx(&self, t: f64) -> f64 {
        match *self {
            Self::Critical { r, c1, c2 } => {
                let power = (r * t).exp();
                r * (c1 + c2 * t) * power + c2 * power
            }
            Self::Overdamped { r1, r2, c1, c2 } => {
                c1 * r1 * (r1 * t).exp() + c2 * r2 * (r2 * t).exp()
            }
            Self::Underdamped { w, r, c1, c2 } => {
                let power = (r * t).exp();
                let (sine, cosine) = (w * t).sin_cos();
                power * (c2 * w * cosine - c1 * w * sine) + r * power * (c2 * sine + c1 * cosine)
            }
        }
    }
}

/// Damped spring pulling from `start` towards `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringSimulation {
    end: f64,
    solution: SpringSolution,
    tolerance: Tolerance,
}

impl SpringSimulation {
    pub fn new(
        spring: SpringDescription,
        start: f64,
        end: f64,
        velocity: f64,
        tolerance: Tolerance,
    ) -> Self {
        Self {
            end,
            solution: SpringSolution::new(spring, start - end, velocity),
            tolerance,
        }
    }

    pub fn end(&self) -> f64 {
        self.end
    }
}

impl Simulation for SpringSimulation {
    fn x(&self, time: f64) -> f64 {
        self.end + self.solution.x(time)
    }

    fn dx(&self, time: f64) -> f64 {
        self.solution.dx(time)
    }

    fn is_done(&self, time: f64) -> bool {
        near_zero(self.solution.x(time), self.tolerance.distance)
            && near_zero(self.solution.dx(time), self.tolerance.velocity)
    }

    fn tolerance(&self) -> Tolerance {
        self.tolerance
    }
}

/// Spring that lands exactly on its end position once settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSpringSimulation(SpringSimulation);

impl ScrollSpringSimulation {
    pub fn new(
        spring: SpringDescription,
        start: f64,
        end: f64,
        velocity: f64,
        tolerance: Tolerance,
    ) -> Self {
        Self(SpringSimulation::new(spring, start, end, velocity, tolerance))
    }

    pub fn end(&self) -> f64 {
        self.0.end()
    }
}

impl Simulation for ScrollSpringSimulation {
    fn x(&self, time: f64) -> f64 {
        if self.is_done(time) {
            self.0.end()
        } else {
            self.0.x(time)
        }
    }

    fn dx(&self, time: f64) -> f64 {
        self.0.dx(time)
    }

    fn is_done(&self, time: f64) -> bool {
        self.0.is_done(time)
    }

    fn tolerance(&self) -> Tolerance {
        self.0.tolerance()
    }
}

/// Exponential velocity decay: after one second the velocity is `drag` times
/// the initial one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionSimulation {
    drag: f64,
    drag_log: f64,
    position: f64,
    velocity: f64,
    tolerance: Tolerance,
}

impl FrictionSimulation {
    pub fn new(drag: f64, position: f64, velocity: f64, tolerance: Tolerance) -> Self {
        Self {
            drag,
            drag_log: drag.ln(),
            position,
            velocity,
            tolerance,
        }
    }

    /// Where the motion comes to rest.
    pub fn final_x(&self) -> f64 {
        self.position - self.velocity / self.drag_log
    }

    /// Time at which `x` is reached, infinite if it never is.
    pub fn time_at_x(&self, x: f64) -> f64 {
        if x == self.position {
            return 0.0;
        }
        let final_x = self.final_x();
        let unreachable = if self.velocity > 0.0 {
            x < self.position || x > final_x
        } else {
            x > self.position || x < final_x
        };
        if self.velocity == 0.0 || unreachable {
            return f64::INFINITY;
        }
        (self.drag_log * (x - self.position) / self.velocity + 1.0).ln() / self.drag_log
    }
}

impl Simulation for FrictionSimulation {
    fn x(&self, time: f64) -> f64 {
        self.position + self.velocity * self.drag.powf(time) / self.drag_log
            - self.velocity / self.drag_log
    }

    fn dx(&self, time: f64) -> f64 {
        self.velocity * self.drag.powf(time)
    }

    fn is_done(&self, time: f64) -> bool {
        self.dx(time).abs() < self.tolerance.velocity
    }

    fn tolerance(&self) -> Tolerance {
        self.tolerance
    }
}

/// Friction that stops dead at either bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedFrictionSimulation {
    friction: FrictionSimulation,
    min: f64,
    max: f64,
}

impl BoundedFrictionSimulation {
    pub fn new(
        drag: f64,
        position: f64,
        velocity: f64,
        min: f64,
        max: f64,
        tolerance: Tolerance,
    ) -> Self {
        Self {
            friction: FrictionSimulation::new(drag, position, velocity, tolerance),
            min,
            max,
        }
    }
}

impl Simulation for BoundedFrictionSimulation {
    fn x(&self, time: f64) -> f64 {
        self.friction.x(time).clamp(self.min, self.max)
    }

    fn dx(&self, time: f64) -> f64 {
        self.friction.dx(time)
    }

    fn is_done(&self, time: f64) -> bool {
        let x = self.x(time);
        let distance = self.friction.tolerance.distance;
        self.friction.is_done(time)
            || (x - self.min).abs() < distance
            || (x - self.max).abs() < distance
    }

    fn tolerance(&self) -> Tolerance {
        self.friction.tolerance
    }
}

/// Friction inside `[leading, trailing]`, springing back once it crosses
/// either edge or when it starts outside them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BouncingScrollSimulation {
    friction: Option<FrictionSimulation>,
    spring: Option<ScrollSpringSimulation>,
    spring_time: f64,
}

impl BouncingScrollSimulation {
    pub const FRICTION_DRAG: f64 = 0.135;
    pub const MAX_SPRING_TRANSFER_VELOCITY: f64 = 5000.0;

    pub fn new(
        spring: SpringDescription,
        position: f64,
        velocity: f64,
        leading: f64,
        trailing: f64,
        tolerance: Tolerance,
    ) -> Self {
        let to = |from: f64, end: f64, v: f64| {
            ScrollSpringSimulation::new(spring, from, end, v, tolerance)
        };

        if position < leading {
            return Self {
                friction: None,
                spring: Some(to(position, leading, velocity)),
                spring_time: f64::NEG_INFINITY,
            };
        }
        if position > trailing {
            return Self {
                friction: None,
                spring: Some(to(position, trailing, velocity)),
                spring_time: f64::NEG_INFINITY,
            };
        }

        let friction = FrictionSimulation::new(Self::FRICTION_DRAG, position, velocity, tolerance);
        let final_x = friction.final_x();
        let edge = if velocity > 0.0 && final_x > trailing {
            Some(trailing)
        } else if velocity < 0.0 && final_x < leading {
            Some(leading)
        } else {
            None
        };

        match edge {
            Some(edge) => {
                let spring_time = friction.time_at_x(edge);
                let transfer = friction.dx(spring_time).clamp(
                    -Self::MAX_SPRING_TRANSFER_VELOCITY,
                    Self::MAX_SPRING_TRANSFER_VELOCITY,
                );
                Self {
                    friction: Some(friction),
                    spring: Some(to(edge, edge, transfer)),
                    spring_time,
                }
            }
            None => Self {
                friction: Some(friction),
                spring: None,
                spring_time: f64::INFINITY,
            },
        }
    }

    /// Active phase and its local time.
    fn phase(&self, time: f64) -> (&dyn Simulation, f64) {
        match (&self.friction, &self.spring) {
            (_, Some(spring)) if time > self.spring_time => {
                let offset = if self.spring_time.is_finite() {
                    self.spring_time
                } else {
                    0.0
                };
                (spring as &dyn Simulation, time - offset)
            }
            (Some(friction), _) => (friction as &dyn Simulation, time),
            (None, Some(spring)) => (spring as &dyn Simulation, time),
            (None, None) => unreachable!("bouncing simulation without a phase"),
        }
    }
}

impl Simulation for BouncingScrollSimulation {
    fn x(&self, time: f64) -> f64 {
        let (simulation, t) = self.phase(time);
        simulation.x(t)
    }

    fn dx(&self, time: f64) -> f64 {
        let (simulation, t) = self.phase(time);
        simulation.dx(t)
    }

    fn is_done(&self, time: f64) -> bool {
        let (simulation, t) = self.phase(time);
        simulation.is_done(t)
    }

    fn tolerance(&self) -> Tolerance {
        let (simulation, _) = self.phase(0.0);
        simulation.tolerance()
    }
}
