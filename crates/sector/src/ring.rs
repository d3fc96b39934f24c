use crate::constraints::{SectorConstraints, SectorDimensions};
use crate::node::{SectorNode, SectorParentData};

/// Children share one radius band and split the angular span between them.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorRing {
    pub(crate) desired_delta_radius: f64,
    pub(crate) padding: f64,
    pub(crate) children: Vec<SectorNode>,
}

impl SectorRing {
    pub fn new(desired_delta_radius: f64, padding: f64) -> Self {
        Self {
            desired_delta_radius,
            padding,
            children: Vec::new(),
        }
    }

    /// Angle that spans `padding` at the ring's outer edge.
    fn padding_theta(&self, radius: f64, outer_delta_radius: f64) -> f64 {
        (self.padding / (radius + outer_delta_radius).max(1.0)).atan()
    }

    fn inner_delta_radius(&self, outer_delta_radius: f64) -> f64 {
        (outer_delta_radius - self.padding * 2.0).max(0.0)
    }

    pub(crate) fn intrinsic_dimensions(
        &self,
        constraints: &SectorConstraints,
        radius: f64,
    ) -> SectorDimensions {
        let outer_delta_radius = constraints.constrain_delta_radius(self.desired_delta_radius);
        let inner_delta_radius = self.inner_delta_radius(outer_delta_radius);
        let child_radius = radius + self.padding;
        let padding_theta = self.padding_theta(radius, outer_delta_radius);

        let end = distribute(
            self.children.len(),
            padding_theta,
            padding_theta,
            constraints.max_delta_theta,
            |index, inner_max_theta, _| {
                self.children[index]
                    .intrinsic_dimensions(
                        &SectorConstraints::with_max(inner_delta_radius, inner_max_theta),
                        child_radius,
                    )
                    .delta_theta
            },
        );

        SectorDimensions::with_constraints(constraints, outer_delta_radius, end)
    }

    pub(crate) fn perform_layout(
        &mut self,
        constraints: &SectorConstraints,
        parent: SectorParentData,
    ) -> SectorDimensions {
        let delta_radius = constraints.constrain_delta_radius(self.desired_delta_radius);
        let inner_delta_radius = self.inner_delta_radius(delta_radius);
        let child_radius = parent.radius + self.padding;
        let padding_theta = self.padding_theta(parent.radius, delta_radius);

        let children = &mut self.children;
        let end = distribute(
            children.len(),
            parent.theta + padding_theta,
            padding_theta,
            constraints.max_delta_theta,
            |index, inner_max_theta, theta| {
                let child = &mut children[index];
                child.set_parent_data(SectorParentData::new(child_radius, theta));
                child.layout(SectorConstraints::with_max(inner_delta_radius, inner_max_theta));
                child.delta_theta()
            },
        );

        log::trace!(
            "ring at r={:.2} laid out {} children over {:.4} rad",
            parent.radius,
            children.len(),
            end - parent.theta
        );
        SectorDimensions::new(delta_radius, end - parent.theta)
    }
}

/// Walks `count` children along the angular axis starting at `start`. `place`
/// receives the child index, the angle still available and the child's start
/// angle, and returns the angle the child consumed. Returns the final cursor.
fn distribute(
    count: usize,
    start: f64,
    padding_theta: f64,
    max_delta_theta: f64,
    mut place: impl FnMut(usize, f64, f64) -> f64,
) -> f64 {
    let mut cursor = start;
    let mut remaining = (max_delta_theta - padding_theta * 2.0).max(0.0);

    for index in 0..count {
        if index > 0 {
            cursor += padding_theta;
            remaining = (remaining - padding_theta).max(0.0);
        }
        let consumed = place(index, remaining, cursor);
        cursor += consumed;
        remaining = (remaining - consumed).max(0.0);
    }
    cursor
}
