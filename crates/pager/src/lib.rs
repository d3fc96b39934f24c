//! Page-snapping scroll: a position measured in pages, physics that settle
//! flings on page boundaries, and a pager view that reports page changes.

pub mod animation;
pub mod controller;
pub mod curve;
pub mod error;
pub mod metrics;
pub mod notification;
pub mod physics;
pub mod position;
pub mod simulation;
pub mod view;

pub use animation::{AnimationHandle, AnimationOutcome};
pub use controller::{PageController, SharedPosition};
pub use curve::Curve;
pub use error::PagerError;
pub use metrics::{PageMetrics, ScrollMetrics};
pub use notification::ScrollNotification;
pub use physics::{BouncingScrollPhysics, ClampingScrollPhysics, PageScrollPhysics, ScrollPhysics};
pub use position::{PagePosition, Pixels};
pub use simulation::{Simulation, SpringDescription, Tolerance};
pub use view::{PageChildren, PageView, VisiblePage};
