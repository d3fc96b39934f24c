use crate::constraints::{SectorConstraints, SectorDimensions};
use crate::node::{SectorNode, SectorParentData};

/// Children share one angular wedge and stack outwards in radius.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorSlice {
    pub(crate) desired_delta_theta: f64,
    pub(crate) padding: f64,
    pub(crate) children: Vec<SectorNode>,
}

impl SectorSlice {
    pub fn new(desired_delta_theta: f64, padding: f64) -> Self {
        Self {
            desired_delta_theta,
            padding,
            children: Vec::new(),
        }
    }

    fn padding_theta(&self, radius: f64) -> f64 {
        (self.padding / radius.max(1.0)).atan()
    }

    pub(crate) fn intrinsic_dimensions(
        &self,
        constraints: &SectorConstraints,
        radius: f64,
    ) -> SectorDimensions {
        let outer_delta_theta = constraints.constrain_delta_theta(self.desired_delta_theta);
        let inner_delta_theta = (outer_delta_theta - self.padding_theta(radius) * 2.0).max(0.0);

        let end = self.stack(
            radius + self.padding,
            constraints.max_delta_radius,
            |children, index, inner_max_radius, child_radius| {
                children[index]
                    .intrinsic_dimensions(
                        &SectorConstraints::with_max(inner_max_radius, inner_delta_theta),
                        child_radius,
                    )
                    .delta_radius
            },
        );

        SectorDimensions::with_constraints(constraints, end - radius, outer_delta_theta)
    }

    pub(crate) fn perform_layout(
        &mut self,
        constraints: &SectorConstraints,
        parent: SectorParentData,
    ) -> SectorDimensions {
        let delta_theta = constraints.constrain_delta_theta(self.desired_delta_theta);
        let padding_theta = self.padding_theta(parent.radius);
        let inner_theta = parent.theta + padding_theta;
        let inner_delta_theta = (delta_theta - padding_theta * 2.0).max(0.0);

        let padding = self.padding;
        let children = &mut self.children;
        let mut cursor = parent.radius + padding;
        let mut remaining = (constraints.max_delta_radius - padding * 2.0).max(0.0);

        // Padding follows every child, so the outermost band is inset too.
        for child in children.iter_mut() {
            child.set_parent_data(SectorParentData::new(cursor, inner_theta));
            child.layout(SectorConstraints::with_max(remaining, inner_delta_theta));
            cursor += child.delta_radius() + padding;
            remaining = (remaining - child.delta_radius() - padding).max(0.0);
        }

        log::trace!(
            "slice at θ={:.4} stacked {} children to r={:.2}",
            parent.theta,
            children.len(),
            cursor
        );
        SectorDimensions::new(cursor - parent.radius, delta_theta)
    }

    /// Radial walk used for intrinsic estimates. Returns the final radius.
    fn stack(
        &self,
        start: f64,
        max_delta_radius: f64,
        measure: impl Fn(&[SectorNode], usize, f64, f64) -> f64,
    ) -> f64 {
        let mut cursor = start;
        let mut remaining = (max_delta_radius - self.padding * 2.0).max(0.0);

        for index in 0..self.children.len() {
            let consumed = measure(&self.children, index, remaining, cursor);
            cursor += consumed + self.padding;
            remaining = (remaining - consumed - self.padding).max(0.0);
        }
        cursor
    }
}

#[cfg(test)]
mod tests {
    use crate::TWO_PI;
    use crate::constraints::SectorConstraints;
    use crate::node::{SectorNode, SectorParentData};
    use palette::Srgba;

    fn band(delta_radius: f64) -> SectorNode {
        SectorNode::solid(Srgba::new(0.0, 1.0, 0.0, 1.0)).with_desired_delta_radius(delta_radius)
    }

    #[test]
    fn test_slice_stacks_children_outwards() {
        let mut slice =
            SectorNode::slice(1.0, 0.0).with_children(vec![band(10.0), band(15.0), band(5.0)]);
        slice.set_parent_data(SectorParentData::new(20.0, 0.5));
        slice.layout(SectorConstraints::with_max(100.0, TWO_PI));

        let radii: Vec<f64> = slice
            .children()
            .iter()
            .map(|c| c.parent_data().radius)
            .collect();
        assert_eq!(radii, vec![20.0, 30.0, 45.0]);
        assert_eq!(slice.delta_radius(), 30.0);
        assert_eq!(slice.delta_theta(), 1.0);
        assert!(slice.children().iter().all(|c| c.parent_data().theta == 0.5));
        assert!(slice.children().iter().all(|c| c.delta_theta() == 1.0));
    }

    #[test]
    fn test_slice_padding_narrows_wedge_symmetrically() {
        let padding = 5.0;
        let radius = 50.0;
        let mut slice = SectorNode::slice(1.2, padding).with_children(vec![band(10.0), band(10.0)]);
        slice.set_parent_data(SectorParentData::new(radius, 0.0));
        slice.layout(SectorConstraints::with_max(100.0, TWO_PI));

        let padding_theta = (padding / radius).atan();
        let first = &slice.children()[0];
        assert!((first.parent_data().theta - padding_theta).abs() < 1e-12);
        assert!((first.delta_theta() - (1.2 - 2.0 * padding_theta)).abs() < 1e-12);
        assert_eq!(first.parent_data().radius, 55.0);
        assert_eq!(slice.children()[1].parent_data().radius, 70.0);
        assert_eq!(slice.delta_radius(), 35.0);
    }

    #[test]
    fn test_slice_pads_both_radial_edges() {
        let mut slice = SectorNode::slice(1.0, 3.0).with_children(vec![band(8.0)]);
        slice.set_parent_data(SectorParentData::new(20.0, 0.0));
        slice.layout(SectorConstraints::with_max(100.0, TWO_PI));

        let child = &slice.children()[0];
        let inner_gap = child.parent_data().radius - 20.0;
        let outer_gap = 20.0 + slice.delta_radius() - (child.parent_data().radius + child.delta_radius());
        assert_eq!(inner_gap, 3.0);
        assert_eq!(outer_gap, 3.0);
        assert_eq!(slice.delta_radius(), 14.0);
    }

    #[test]
    fn test_slice_trailing_padding_fits_budget() {
        // Budget is max minus both edges: 30 - 2 * 5 = 20 for the children.
        let mut slice = SectorNode::slice(1.0, 5.0).with_children(vec![band(50.0)]);
        slice.set_parent_data(SectorParentData::new(10.0, 0.0));
        slice.layout(SectorConstraints::with_max(30.0, TWO_PI));

        assert_eq!(slice.children()[0].delta_radius(), 20.0);
        assert_eq!(slice.delta_radius(), 30.0);
    }

    #[test]
    fn test_slice_at_origin_clamps_padding_denominator() {
        let mut slice = SectorNode::slice(1.0, 1.0).with_children(vec![band(3.0)]);
        slice.set_parent_data(SectorParentData::new(0.0, 0.0));
        slice.layout(SectorConstraints::with_max(10.0, TWO_PI));

        let padding_theta = 1.0f64.atan();
        assert!((slice.children()[0].parent_data().theta - padding_theta).abs() < 1e-12);
        assert!(slice.delta_radius().is_finite());
    }

    #[test]
    fn test_slice_budget_limits_last_child() {
        let mut slice = SectorNode::slice(1.0, 0.0).with_children(vec![band(30.0), band(30.0)]);
        slice.set_parent_data(SectorParentData::new(0.0, 0.0));
        slice.layout(SectorConstraints::with_max(40.0, TWO_PI));

        assert_eq!(slice.children()[1].delta_radius(), 10.0);
        assert_eq!(slice.delta_radius(), 40.0);
    }

    #[test]
    fn test_slice_intrinsics_match_layout() {
        let mut slice = SectorNode::slice(0.8, 2.0).with_children(vec![band(12.0), band(7.0)]);
        let constraints = SectorConstraints::with_max(60.0, TWO_PI);
        let intrinsic = slice.intrinsic_dimensions(&constraints, 40.0);

        slice.set_parent_data(SectorParentData::new(40.0, 0.0));
        slice.layout(constraints);
        assert_eq!(intrinsic.delta_radius, slice.delta_radius());
        assert_eq!(intrinsic.delta_theta, slice.delta_theta());
    }
}
