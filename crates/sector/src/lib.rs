//! Polar layout: sectors measured in radius and angle, laid out by their
//! parents under [`SectorConstraints`] and hosted in box layout by [`SectorBox`].

pub mod adapter;
pub mod constraints;
pub mod geometry;
pub mod hit_test;
pub mod node;
pub mod paint;
pub mod ring;
pub mod slice;
pub mod solid;

pub use adapter::SectorBox;
pub use constraints::{SectorConstraints, SectorDimensions};
pub use geometry::{BoxConstraints, Point, Size};
pub use hit_test::{HitTestEntry, HitTestResult, NodePath, PointerEvent};
pub use node::{SectorKind, SectorNode, SectorParentData};
pub use paint::{Decoration, Wedge};

pub const TWO_PI: f64 = 2.0 * std::f64::consts::PI;
