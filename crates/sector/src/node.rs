use crate::constraints::{SectorConstraints, SectorDimensions};
use crate::geometry::Point;
use crate::hit_test::{HitTestEntry, HitTestResult, NodePath, PointerEvent};
use crate::paint::{Decoration, Wedge};
use crate::ring::SectorRing;
use crate::slice::SectorSlice;
use crate::solid::SolidColor;
use cairo::Context;
use palette::Srgba;

/// Absolute start of a sector in the global polar frame, assigned by its parent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SectorParentData {
    pub radius: f64,
    pub theta: f64,
}

impl SectorParentData {
    pub fn new(radius: f64, theta: f64) -> Self {
        Self { radius, theta }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectorKind {
    Solid(SolidColor),
    Ring(SectorRing),
    Slice(SectorSlice),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorNode {
    kind: SectorKind,
    decoration: Decoration,
    sized_by_parent: bool,
    parent_data: SectorParentData,
    constraints: Option<SectorConstraints>,
    laid_out_at: Option<SectorParentData>,
    delta_radius: f64,
    delta_theta: f64,
    needs_layout: bool,
    needs_paint: bool,
}

impl SectorNode {
    fn new(kind: SectorKind, decoration: Decoration) -> Self {
        Self {
            kind,
            decoration,
            sized_by_parent: false,
            parent_data: SectorParentData::default(),
            constraints: None,
            laid_out_at: None,
            delta_radius: 0.0,
            delta_theta: 0.0,
            needs_layout: true,
            needs_paint: true,
        }
    }

    pub fn solid(background: Srgba<f64>) -> Self {
        Self::new(
            SectorKind::Solid(SolidColor::new(background)),
            Decoration::color(background),
        )
    }

    pub fn ring(desired_delta_radius: f64, padding: f64) -> Self {
        Self::new(
            SectorKind::Ring(SectorRing::new(desired_delta_radius, padding)),
            Decoration::none(),
        )
    }

    pub fn slice(desired_delta_theta: f64, padding: f64) -> Self {
        Self::new(
            SectorKind::Slice(SectorSlice::new(desired_delta_theta, padding)),
            Decoration::none(),
        )
    }

    pub fn with_decoration(mut self, decoration: Decoration) -> Self {
        self.decoration = decoration;
        self
    }

    pub fn with_children(mut self, children: Vec<SectorNode>) -> Self {
        children.into_iter().for_each(|child| self.push_child(child));
        self
    }

    pub fn with_desired_delta_radius(mut self, delta_radius: f64) -> Self {
        self.set_desired_delta_radius(delta_radius);
        self
    }

    pub fn with_desired_delta_theta(mut self, delta_theta: f64) -> Self {
        self.set_desired_delta_theta(delta_theta);
        self
    }

    pub fn with_highlight(mut self, highlight: Srgba<f64>) -> Self {
        if let SectorKind::Solid(solid) = &mut self.kind {
            solid.highlight = highlight;
        }
        self
    }

    /// Sizes the node purely from its constraints, ignoring desired deltas.
    pub fn sized_by_parent(mut self, sized_by_parent: bool) -> Self {
        self.sized_by_parent = sized_by_parent;
        self.needs_layout = true;
        self
    }

    pub fn kind(&self) -> &SectorKind {
        &self.kind
    }

    pub fn decoration(&self) -> &Decoration {
        &self.decoration
    }

    pub fn parent_data(&self) -> SectorParentData {
        self.parent_data
    }

    pub fn constraints(&self) -> Option<&SectorConstraints> {
        self.constraints.as_ref()
    }

    pub fn delta_radius(&self) -> f64 {
        self.delta_radius
    }

    pub fn delta_theta(&self) -> f64 {
        self.delta_theta
    }

    pub fn dimensions(&self) -> SectorDimensions {
        SectorDimensions::new(self.delta_radius, self.delta_theta)
    }

    pub fn children(&self) -> &[SectorNode] {
        match &self.kind {
            SectorKind::Solid(_) => &[],
            SectorKind::Ring(ring) => &ring.children,
            SectorKind::Slice(slice) => &slice.children,
        }
    }

    fn children_vec_mut(&mut self) -> Option<&mut Vec<SectorNode>> {
        match &mut self.kind {
            SectorKind::Solid(_) => None,
            SectorKind::Ring(ring) => Some(&mut ring.children),
            SectorKind::Slice(slice) => Some(&mut slice.children),
        }
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut SectorNode> {
        self.children_vec_mut()?.get_mut(index)
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&SectorNode> {
        match path.split_first() {
            None => Some(self),
            Some((&index, rest)) => self.children().get(index)?.node_at(rest),
        }
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut SectorNode> {
        match path.split_first() {
            None => Some(self),
            Some((&index, rest)) => self.child_mut(index)?.node_at_mut(rest),
        }
    }

    // Mutation surface for the declaring layer. Size-affecting changes mark
    // layout, purely visual ones mark paint.

    pub fn set_decoration(&mut self, decoration: Decoration) {
        if self.decoration != decoration {
            self.decoration = decoration;
            self.needs_paint = true;
        }
    }

    pub fn set_padding(&mut self, padding: f64) {
        let current = match &mut self.kind {
            SectorKind::Solid(_) => return,
            SectorKind::Ring(ring) => &mut ring.padding,
            SectorKind::Slice(slice) => &mut slice.padding,
        };
        if *current != padding {
            *current = padding;
            self.needs_layout = true;
        }
    }

    pub fn set_desired_delta_radius(&mut self, delta_radius: f64) {
        let current = match &mut self.kind {
            SectorKind::Solid(solid) => &mut solid.desired_delta_radius,
            SectorKind::Ring(ring) => &mut ring.desired_delta_radius,
            SectorKind::Slice(_) => return,
        };
        if *current != delta_radius {
            *current = delta_radius;
            self.needs_layout = true;
        }
    }

    pub fn set_desired_delta_theta(&mut self, delta_theta: f64) {
        let current = match &mut self.kind {
            SectorKind::Solid(solid) => &mut solid.desired_delta_theta,
            SectorKind::Slice(slice) => &mut slice.desired_delta_theta,
            SectorKind::Ring(_) => return,
        };
        if *current != delta_theta {
            *current = delta_theta;
            self.needs_layout = true;
        }
    }

    /// Appends a child. Leaves have no child list and drop it.
    pub fn push_child(&mut self, child: SectorNode) {
        let count = self.children().len();
        self.insert_child(count, child);
    }

    pub fn insert_child(&mut self, index: usize, child: SectorNode) {
        if let Some(children) = self.children_vec_mut() {
            children.insert(index.min(children.len()), child);
            self.needs_layout = true;
        } else {
            log::warn!("ignoring child inserted into a leaf sector");
        }
    }

    pub fn remove_child(&mut self, index: usize) -> Option<SectorNode> {
        let children = self.children_vec_mut()?;
        if index >= children.len() {
            return None;
        }
        let removed = children.remove(index);
        self.needs_layout = true;
        Some(removed)
    }

    pub fn clear_children(&mut self) {
        if let Some(children) = self.children_vec_mut()
            && !children.is_empty()
        {
            children.clear();
            self.needs_layout = true;
        }
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout || self.children().iter().any(SectorNode::needs_layout)
    }

    pub fn needs_paint(&self) -> bool {
        self.needs_paint || self.children().iter().any(SectorNode::needs_paint)
    }

    pub fn mark_needs_layout(&mut self) {
        self.needs_layout = true;
    }

    pub fn mark_painted(&mut self) {
        self.needs_paint = false;
        if let Some(children) = self.children_vec_mut() {
            children.iter_mut().for_each(SectorNode::mark_painted);
        }
    }

    pub(crate) fn set_parent_data(&mut self, parent_data: SectorParentData) {
        self.parent_data = parent_data;
    }

    /// Size this node would take under `constraints` when starting at `radius`,
    /// without committing a layout.
    pub fn intrinsic_dimensions(
        &self,
        constraints: &SectorConstraints,
        radius: f64,
    ) -> SectorDimensions {
        if self.sized_by_parent {
            return SectorDimensions::min_of(constraints);
        }
        match &self.kind {
            SectorKind::Solid(solid) => solid.intrinsic_dimensions(constraints),
            SectorKind::Ring(ring) => ring.intrinsic_dimensions(constraints, radius),
            SectorKind::Slice(slice) => slice.intrinsic_dimensions(constraints, radius),
        }
    }

    pub fn layout(&mut self, constraints: SectorConstraints) {
        constraints.debug_assert_is_valid();

        let clean = !self.needs_layout()
            && self.constraints == Some(constraints)
            && self.laid_out_at == Some(self.parent_data);
        if clean {
            return;
        }

        self.constraints = Some(constraints);
        if self.sized_by_parent {
            self.perform_resize();
        }
        self.perform_layout();

        self.laid_out_at = Some(self.parent_data);
        self.needs_layout = false;
        self.needs_paint = true;
    }

    fn perform_resize(&mut self) {
        let constraints = self.laid_out_constraints();
        let dimensions = SectorDimensions::min_of(&constraints);
        self.delta_radius = dimensions.delta_radius;
        self.delta_theta = dimensions.delta_theta;
    }

    fn perform_layout(&mut self) {
        let constraints = self.laid_out_constraints();
        let parent_data = self.parent_data;
        let dimensions = match &mut self.kind {
            SectorKind::Solid(solid) => solid.perform_layout(&constraints),
            SectorKind::Ring(ring) => ring.perform_layout(&constraints, parent_data),
            SectorKind::Slice(slice) => slice.perform_layout(&constraints, parent_data),
        };
        if !self.sized_by_parent {
            self.delta_radius = dimensions.delta_radius;
            self.delta_theta = dimensions.delta_theta;
        }
    }

    fn laid_out_constraints(&self) -> SectorConstraints {
        match self.constraints {
            Some(constraints) => constraints,
            None => panic!("sector laid out before its parent assigned constraints"),
        }
    }

    pub fn contains(&self, radius: f64, theta: f64) -> bool {
        let origin = self.parent_data;
        radius >= origin.radius
            && radius < origin.radius + self.delta_radius
            && theta >= origin.theta
            && theta < origin.theta + self.delta_theta
    }

    /// Records every sector under `(radius, theta)`, innermost first. Children
    /// are tried last to first and the first child that reports a hit wins.
    pub fn hit_test(&self, result: &mut HitTestResult, radius: f64, theta: f64) -> bool {
        let mut path = Vec::new();
        self.hit_test_at(result, radius, theta, &mut path)
    }

    fn hit_test_at(
        &self,
        result: &mut HitTestResult,
        radius: f64,
        theta: f64,
        path: &mut Vec<usize>,
    ) -> bool {
        if !self.contains(radius, theta) {
            return false;
        }

        for (index, child) in self.children().iter().enumerate().rev() {
            path.push(index);
            let hit = child.hit_test_at(result, radius, theta, path);
            path.pop();
            if hit {
                break;
            }
        }

        result.add(HitTestEntry::Sector(NodePath::from(path.clone())));
        true
    }

    pub fn handle_event(&mut self, event: PointerEvent) {
        if let SectorKind::Solid(solid) = &self.kind {
            let decoration = solid.decoration_for(event);
            self.set_decoration(decoration);
        }
    }

    pub fn paint(&self, cr: &Context, center: Point) -> Result<(), cairo::Error> {
        if let Some(color) = self.decoration.color {
            Wedge {
                radius: self.parent_data.radius,
                delta_radius: self.delta_radius,
                theta: self.parent_data.theta,
                delta_theta: self.delta_theta,
            }
            .fill(cr, center, color)?;
        }

        for child in self.children() {
            child.paint(cr, center)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TWO_PI;
    use crate::paint::testing::{pixel, surface};

    fn red() -> Srgba<f64> {
        Srgba::new(1.0, 0.0, 0.0, 1.0)
    }

    fn blue() -> Srgba<f64> {
        Srgba::new(0.0, 0.0, 1.0, 1.0)
    }

    fn laid_out_ring() -> SectorNode {
        let mut ring = SectorNode::ring(40.0, 0.0).with_children(vec![
            SectorNode::solid(red()).with_desired_delta_theta(1.0),
            SectorNode::solid(blue()).with_desired_delta_theta(2.0),
        ]);
        ring.set_parent_data(SectorParentData::new(10.0, 0.0));
        ring.layout(SectorConstraints::with_max(40.0, TWO_PI));
        ring
    }

    #[test]
    fn test_leaf_layout_clamps_desired_deltas() {
        let mut leaf = SectorNode::solid(red())
            .with_desired_delta_radius(80.0)
            .with_desired_delta_theta(0.5);
        leaf.layout(SectorConstraints::with_max(30.0, TWO_PI));
        assert_eq!(leaf.dimensions(), SectorDimensions::new(30.0, 0.5));
    }

    #[test]
    fn test_sized_by_parent_takes_minimum() {
        let mut leaf = SectorNode::solid(red()).sized_by_parent(true);
        let constraints = SectorConstraints {
            min_delta_radius: 4.0,
            max_delta_radius: 30.0,
            min_delta_theta: 0.25,
            max_delta_theta: TWO_PI,
        };
        leaf.layout(constraints);
        assert_eq!(leaf.dimensions(), SectorDimensions::new(4.0, 0.25));
        assert_eq!(
            leaf.intrinsic_dimensions(&constraints, 0.0),
            SectorDimensions::new(4.0, 0.25)
        );
    }

    #[test]
    #[should_panic(expected = "not normalized")]
    fn test_layout_rejects_inverted_constraints() {
        let mut leaf = SectorNode::solid(red());
        leaf.layout(SectorConstraints {
            min_delta_theta: 2.0,
            max_delta_theta: 1.0,
            ..SectorConstraints::default()
        });
    }

    #[test]
    fn test_hit_test_reports_innermost_child_first() {
        let ring = laid_out_ring();
        let mut result = HitTestResult::new();

        assert!(ring.hit_test(&mut result, 30.0, 1.5));
        assert_eq!(result.entries().len(), 2);
        assert_eq!(result.first(), Some(&HitTestEntry::Sector(NodePath::from(vec![1]))));
        assert_eq!(result.entries()[1], HitTestEntry::Sector(NodePath::root()));
    }

    #[test]
    fn test_hit_test_rejects_points_outside_box() {
        let ring = laid_out_ring();
        let mut result = HitTestResult::new();

        // inside the hole
        assert!(!ring.hit_test(&mut result, 5.0, 0.5));
        // outer edge is exclusive
        assert!(!ring.hit_test(&mut result, 50.0, 0.5));
        // beyond the children's sweep
        assert!(!ring.hit_test(&mut result, 30.0, 3.5));
        assert!(result.is_empty());
    }

    #[test]
    fn test_relayout_skipped_until_mutated() {
        let mut ring = laid_out_ring();
        assert!(!ring.needs_layout());
        ring.mark_painted();

        ring.layout(SectorConstraints::with_max(40.0, TWO_PI));
        assert!(!ring.needs_paint());

        ring.child_mut(0).unwrap().set_desired_delta_theta(0.5);
        assert!(ring.needs_layout());
        ring.layout(SectorConstraints::with_max(40.0, TWO_PI));
        assert!(!ring.needs_layout());
        assert!(ring.needs_paint());
        assert_eq!(ring.children()[1].parent_data().theta, 0.5);
        assert_eq!(ring.delta_theta(), 2.5);
    }

    #[test]
    fn test_decoration_change_only_marks_paint() {
        let mut ring = laid_out_ring();
        ring.mark_painted();

        ring.set_decoration(Decoration::color(blue()));
        assert!(ring.needs_paint());
        assert!(!ring.needs_layout());
    }

    #[test]
    fn test_child_list_mutations_mark_layout() {
        let mut ring = laid_out_ring();
        ring.push_child(SectorNode::solid(red()).with_desired_delta_theta(0.5));
        assert!(ring.needs_layout());
        ring.layout(SectorConstraints::with_max(40.0, TWO_PI));
        assert_eq!(ring.delta_theta(), 3.5);

        let removed = ring.remove_child(0).unwrap();
        assert_eq!(removed.delta_theta(), 1.0);
        ring.layout(SectorConstraints::with_max(40.0, TWO_PI));
        assert_eq!(ring.delta_theta(), 2.5);
        assert!(ring.remove_child(5).is_none());

        ring.clear_children();
        ring.layout(SectorConstraints::with_max(40.0, TWO_PI));
        assert_eq!(ring.delta_theta(), 0.0);
    }

    #[test]
    fn test_pointer_events_swap_leaf_decoration() {
        let mut ring = laid_out_ring();
        ring.mark_painted();
        let leaf = ring.node_at_mut(&[0]).unwrap();

        leaf.handle_event(PointerEvent::Down);
        assert_eq!(leaf.decoration().color, Some(crate::solid::default_highlight()));
        leaf.handle_event(PointerEvent::Up);
        assert_eq!(leaf.decoration().color, Some(red()));
        assert!(ring.needs_paint());
        assert!(!ring.needs_layout());
    }

    #[test]
    fn test_paint_fills_children_in_order() {
        let ring = laid_out_ring();
        let mut surface = surface(120);
        {
            let cr = Context::new(&surface).unwrap();
            ring.paint(&cr, Point::new(60.0, 60.0)).unwrap();
        }

        // angle 0.5 rad at radius 30 lies in the red child
        let (x, y) = (60.0 + 30.0 * 0.5f64.cos(), 60.0 + 30.0 * 0.5f64.sin());
        assert_eq!(pixel(&mut surface, x as usize, y as usize), (255, 0, 0, 255));
        // angle 2.0 rad lies in the blue child
        let (x, y) = (60.0 + 30.0 * 2.0f64.cos(), 60.0 + 30.0 * 2.0f64.sin());
        assert_eq!(pixel(&mut surface, x as usize, y as usize), (0, 0, 255, 255));
        // angle 4.0 rad is not covered by the ring
        let (x, y) = (60.0 + 30.0 * 4.0f64.cos(), 60.0 + 30.0 * 4.0f64.sin());
        assert_eq!(pixel(&mut surface, x as usize, y as usize).3, 0);
    }
}
