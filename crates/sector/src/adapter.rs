use crate::TWO_PI;
use crate::constraints::SectorConstraints;
use crate::geometry::{BoxConstraints, Point, Size};
use crate::hit_test::{HitTestEntry, HitTestResult, PointerEvent};
use crate::node::{SectorNode, SectorParentData};
use cairo::Context;
use std::f64::consts::FRAC_PI_2;

/// Hosts a polar subtree inside box layout. The child grows outwards from
/// `inner_radius` around the centre of the box, starting at angle zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorBox {
    inner_radius: f64,
    child: Option<SectorNode>,
    constraints: Option<BoxConstraints>,
    size: Size,
    needs_layout: bool,
}

impl SectorBox {
    pub fn new(inner_radius: f64, child: Option<SectorNode>) -> Self {
        Self {
            inner_radius,
            child,
            constraints: None,
            size: Size::ZERO,
            needs_layout: true,
        }
    }

    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    pub fn set_inner_radius(&mut self, inner_radius: f64) {
        if self.inner_radius != inner_radius {
            self.inner_radius = inner_radius;
            self.needs_layout = true;
        }
    }

    pub fn child(&self) -> Option<&SectorNode> {
        self.child.as_ref()
    }

    pub fn child_mut(&mut self) -> Option<&mut SectorNode> {
        self.child.as_mut()
    }

    pub fn set_child(&mut self, child: Option<SectorNode>) {
        self.child = child;
        self.needs_layout = true;
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout || self.child.as_ref().is_some_and(SectorNode::needs_layout)
    }

    pub fn needs_paint(&self) -> bool {
        self.needs_layout() || self.child.as_ref().is_some_and(SectorNode::needs_paint)
    }

    pub fn mark_painted(&mut self) {
        if let Some(child) = &mut self.child {
            child.mark_painted();
        }
    }

    /// Square size the box would take if given at most `width` x `height`.
    pub fn intrinsic_dimensions(&self, width: f64, height: f64) -> Size {
        let Some(child) = &self.child else {
            return Size::ZERO;
        };
        if !width.is_finite() && !height.is_finite() {
            return Size::ZERO;
        }

        let max_child_delta_radius = (width.min(height) / 2.0 - self.inner_radius).max(0.0);
        let child_dimensions = child.intrinsic_dimensions(
            &SectorConstraints::with_max(max_child_delta_radius, TWO_PI),
            self.inner_radius,
        );
        Size::square((self.inner_radius + child_dimensions.delta_radius) * 2.0)
    }

    pub fn min_intrinsic_width(&self, height: f64) -> f64 {
        self.intrinsic_dimensions(f64::INFINITY, height).width
    }

    pub fn max_intrinsic_width(&self, height: f64) -> f64 {
        self.intrinsic_dimensions(f64::INFINITY, height).width
    }

    pub fn min_intrinsic_height(&self, width: f64) -> f64 {
        self.intrinsic_dimensions(width, f64::INFINITY).height
    }

    pub fn max_intrinsic_height(&self, width: f64) -> f64 {
        self.intrinsic_dimensions(width, f64::INFINITY).height
    }

    pub fn layout(&mut self, constraints: BoxConstraints) {
        self.constraints = Some(constraints);
        self.needs_layout = false;

        let inner_radius = self.inner_radius;
        let Some(child) = &mut self.child else {
            self.size = constraints.constrain(Size::ZERO);
            return;
        };

        assert!(
            constraints.has_bounded_width() && constraints.has_bounded_height(),
            "a sector box needs bounded constraints, got {constraints:?}"
        );

        let max_child_delta_radius =
            (constraints.max_width.min(constraints.max_height) / 2.0 - inner_radius).max(0.0);
        child.set_parent_data(SectorParentData::new(inner_radius, 0.0));
        child.layout(SectorConstraints::with_max(max_child_delta_radius, TWO_PI));

        let dimension = (inner_radius + child.delta_radius()) * 2.0;
        self.size = constraints.constrain(Size::square(dimension));
        log::debug!(
            "sector box laid out at {:.1}x{:.1} (child dR {:.2}, dθ {:.4})",
            self.size.width,
            self.size.height,
            child.delta_radius(),
            child.delta_theta()
        );
    }

    /// Lays out again only if something changed since the last pass.
    pub fn flush_layout(&mut self, constraints: BoxConstraints) -> bool {
        if !self.needs_layout() && self.constraints == Some(constraints) {
            return false;
        }
        self.layout(constraints);
        true
    }

    /// Polar coordinates of a box-local point relative to the box centre.
    /// Angle zero points along +x and grows clockwise on screen.
    pub fn to_polar(&self, position: Point) -> (f64, f64) {
        let x = position.x - self.size.width / 2.0;
        let y = position.y - self.size.height / 2.0;
        let radius = x.hypot(y);
        let theta = (x.atan2(-y) - FRAC_PI_2).rem_euclid(TWO_PI);
        (radius, theta)
    }

    pub fn hit_test(&self, result: &mut HitTestResult, position: Point) -> bool {
        let Some(child) = &self.child else {
            return false;
        };

        let (radius, theta) = self.to_polar(position);
        if radius < self.inner_radius
            || radius >= self.inner_radius + child.delta_radius()
            || theta > child.delta_theta()
        {
            return false;
        }

        child.hit_test(result, radius, theta);
        result.add(HitTestEntry::Box { position });
        true
    }

    /// Hit-tests `position` and delivers `event` to every sector on the hit
    /// path. Returns whether anything was hit.
    pub fn handle_pointer(&mut self, event: PointerEvent, position: Point) -> bool {
        let mut result = HitTestResult::new();
        if !self.hit_test(&mut result, position) {
            return false;
        }
        let Some(child) = &mut self.child else {
            return false;
        };
        for path in result.sector_paths() {
            if let Some(node) = child.node_at_mut(path) {
                node.handle_event(event);
            }
        }
        true
    }

    /// Delivers `event` to the sector at `path` regardless of position; used to
    /// release a press after the pointer left the sector.
    pub fn dispatch(&mut self, event: PointerEvent, path: &[usize]) {
        if let Some(node) = self.child.as_mut().and_then(|c| c.node_at_mut(path)) {
            node.handle_event(event);
        }
    }

    pub fn paint(&self, cr: &Context, offset: Point) -> Result<(), cairo::Error> {
        match &self.child {
            Some(child) => child.paint(cr, self.size.center(offset)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit_test::NodePath;
    use crate::paint::testing::{pixel, surface};
    use palette::Srgba;
    use std::f64::consts::PI;

    fn green() -> Srgba<f64> {
        Srgba::new(0.0, 1.0, 0.0, 1.0)
    }

    fn ring_box() -> SectorBox {
        let ring = SectorNode::ring(f64::INFINITY, 0.0).with_children(vec![
            SectorNode::solid(green()).with_desired_delta_theta(PI / 2.0),
            SectorNode::solid(green()).with_desired_delta_theta(PI / 2.0),
        ]);
        let mut sector_box = SectorBox::new(20.0, Some(ring));
        sector_box.layout(BoxConstraints::loose(Size::new(200.0, 100.0)));
        sector_box
    }

    #[test]
    fn test_empty_box_takes_minimum_size() {
        let mut sector_box = SectorBox::new(10.0, None);
        sector_box.layout(BoxConstraints {
            min_width: 5.0,
            max_width: 50.0,
            min_height: 7.0,
            max_height: 50.0,
        });
        assert_eq!(sector_box.size(), Size::new(5.0, 7.0));
        assert!(!sector_box.hit_test(&mut HitTestResult::new(), Point::new(2.0, 2.0)));
    }

    #[test]
    fn test_box_fits_child_in_smaller_axis() {
        let sector_box = ring_box();
        assert_eq!(sector_box.size(), Size::square(100.0));
        let child = sector_box.child().unwrap();
        assert_eq!(child.delta_radius(), 30.0);
        assert_eq!(child.parent_data(), SectorParentData::new(20.0, 0.0));
        assert!((child.delta_theta() - PI).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "bounded constraints")]
    fn test_unbounded_box_with_child_fails_fast() {
        let mut sector_box = SectorBox::new(0.0, Some(SectorNode::solid(green())));
        sector_box.layout(BoxConstraints {
            max_width: 100.0,
            ..BoxConstraints::default()
        });
    }

    #[test]
    fn test_to_polar_convention() {
        let sector_box = ring_box();
        let (radius, theta) = sector_box.to_polar(Point::new(80.0, 50.0));
        assert!((radius - 30.0).abs() < 1e-12);
        assert!(theta.abs() < 1e-12);

        let (_, theta) = sector_box.to_polar(Point::new(50.0, 80.0));
        assert!((theta - PI / 2.0).abs() < 1e-12);

        let (_, theta) = sector_box.to_polar(Point::new(50.0, 20.0));
        assert!((theta - 3.0 * PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_box_hit_test_reaches_child_sector() {
        let sector_box = ring_box();
        let mut result = HitTestResult::new();

        // below the centre: theta = pi/2, inside the second quarter
        let position = Point::new(45.0, 85.0);
        assert!(sector_box.hit_test(&mut result, position));
        let entries = result.entries();
        assert_eq!(entries[0], HitTestEntry::Sector(NodePath::from(vec![1])));
        assert_eq!(entries[1], HitTestEntry::Sector(NodePath::root()));
        assert_eq!(entries[2], HitTestEntry::Box { position });
    }

    #[test]
    fn test_box_hit_test_rejections() {
        let sector_box = ring_box();
        let mut result = HitTestResult::new();

        // inside the inner radius
        assert!(!sector_box.hit_test(&mut result, Point::new(55.0, 50.0)));
        // above the centre, past the child's sweep
        assert!(!sector_box.hit_test(&mut result, Point::new(50.0, 15.0)));
        // outside the outer radius
        assert!(!sector_box.hit_test(&mut result, Point::new(99.0, 99.0)));
        assert!(result.is_empty());
    }

    #[test]
    fn test_intrinsic_size_uses_child_estimate() {
        let sector_box = ring_box();
        assert_eq!(sector_box.min_intrinsic_width(100.0), 100.0);
        assert_eq!(sector_box.max_intrinsic_height(60.0), 60.0);
        assert_eq!(sector_box.intrinsic_dimensions(f64::INFINITY, f64::INFINITY), Size::ZERO);
        assert_eq!(SectorBox::new(5.0, None).min_intrinsic_width(100.0), 0.0);
    }

    #[test]
    fn test_flush_layout_skips_clean_tree() {
        let mut sector_box = ring_box();
        let constraints = BoxConstraints::loose(Size::new(200.0, 100.0));
        assert!(!sector_box.flush_layout(constraints));

        sector_box.set_inner_radius(10.0);
        assert!(sector_box.flush_layout(constraints));
        assert_eq!(sector_box.child().unwrap().delta_radius(), 40.0);

        sector_box
            .child_mut()
            .unwrap()
            .child_mut(0)
            .unwrap()
            .set_desired_delta_theta(0.5);
        assert!(sector_box.flush_layout(constraints));
        assert!(!sector_box.flush_layout(constraints));
    }

    #[test]
    fn test_pointer_down_highlights_hit_leaf() {
        let mut sector_box = ring_box();
        assert!(sector_box.handle_pointer(PointerEvent::Down, Point::new(85.0, 55.0)));

        let child = sector_box.child().unwrap();
        assert_eq!(
            child.children()[0].decoration().color,
            Some(crate::solid::default_highlight())
        );
        assert_eq!(child.children()[1].decoration().color, Some(green()));

        sector_box.dispatch(PointerEvent::Up, &[0]);
        let child = sector_box.child().unwrap();
        assert_eq!(child.children()[0].decoration().color, Some(green()));
        assert!(!sector_box.handle_pointer(PointerEvent::Down, Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_paint_recenters_child() {
        let sector_box = ring_box();
        let mut surface = surface(140);
        {
            let cr = Context::new(&surface).unwrap();
            sector_box.paint(&cr, Point::new(20.0, 20.0)).unwrap();
        }
        // box centre is (70, 70); theta = pi/4 at radius 35
        assert_eq!(pixel(&mut surface, 94, 94), (0, 255, 0, 255));
        // upper half is outside the child's sweep
        assert_eq!(pixel(&mut surface, 70, 35).3, 0);
    }
}
