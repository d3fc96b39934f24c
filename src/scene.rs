//! Headless model of the viewer window: a pager of sector pages, pointer
//! routing between sector highlights and page drags, and painting.

use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use cairo::Context;
use pager::{
    AnimationHandle, AnimationOutcome, Curve, PageController, PageView, PagerError, VisiblePage,
};
use palette::Srgba;
use sector::{
    BoxConstraints, HitTestResult, NodePath, Point, PointerEvent, SectorBox, SectorNode, Size,
};

use crate::config::{Config, NodeKind, SectorConfig};

/// Horizontal travel before a press turns into a page drag.
pub const DRAG_SLOP: f64 = 8.0;

const VELOCITY_HORIZON: Duration = Duration::from_millis(100);
const ASSUME_STOPPED: Duration = Duration::from_millis(40);
const MAX_FLING_VELOCITY: f64 = 8000.0;

/// Builds the sector tree for one configured sector. Angles are converted
/// from degrees; solids without a color use `fill`.
pub fn build_sector(config: &SectorConfig, highlight: Srgba<f64>, fill: Srgba<f64>) -> SectorNode {
    let node = match config.kind {
        NodeKind::Ring => SectorNode::ring(f64::INFINITY, config.padding),
        NodeKind::Slice => SectorNode::slice(sector::TWO_PI, config.padding),
        NodeKind::Solid => {
            SectorNode::solid(config.color.map_or(fill, |c| *c)).with_highlight(highlight)
        }
    };
    let node = match config.delta_radius {
        Some(delta_radius) => node.with_desired_delta_radius(delta_radius),
        None => node,
    };
    let node = match config.delta_theta {
        Some(degrees) => node.with_desired_delta_theta(degrees.to_radians()),
        None => node,
    };
    node.with_children(
        config
            .children
            .iter()
            .map(|child| build_sector(child, highlight, fill))
            .collect(),
    )
}

fn build_pages(config: &Config) -> Vec<SectorBox> {
    config
        .pages
        .iter()
        .map(|root| {
            let node = build_sector(root, *config.highlight, *config.fill);
            SectorBox::new(config.inner_radius, Some(node))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

#[derive(Debug)]
struct Press {
    page: usize,
    origin: Point,
    last: Point,
    paths: Vec<NodePath>,
    dragging: bool,
}

/// Horizontal pointer velocity over the most recent samples.
#[derive(Debug, Default)]
struct VelocityTracker {
    samples: VecDeque<(Duration, f64)>,
}

impl VelocityTracker {
    fn reset(&mut self) {
        self.samples.clear();
    }

    fn add(&mut self, time: Duration, x: f64) {
        self.samples.push_back((time, x));
        while let Some(&(oldest, _)) = self.samples.front() {
            if time.saturating_sub(oldest) <= VELOCITY_HORIZON {
                break;
            }
            self.samples.pop_front();
        }
    }

    /// Pixels per second, zero if the pointer paused before the last sample.
    fn velocity(&self) -> f64 {
        let (Some(&(t0, x0)), Some(&(t1, x1))) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        let paused = self
            .samples
            .iter()
            .rev()
            .nth(1)
            .is_some_and(|&(previous, _)| t1.saturating_sub(previous) > ASSUME_STOPPED);
        let dt = t1.saturating_sub(t0).as_secs_f64();
        if paused || dt <= 0.0 {
            return 0.0;
        }
        ((x1 - x0) / dt).clamp(-MAX_FLING_VELOCITY, MAX_FLING_VELOCITY)
    }
}

pub struct Scene {
    pages: PageView<SectorBox>,
    viewport: Size,
    page_duration: Duration,
    curve: Curve,
    press: Option<Press>,
    tracker: VelocityTracker,
    on_page: Rc<dyn Fn(usize)>,
}

impl Scene {
    /// `on_page` runs whenever the pager settles on a different page.
    pub fn new(config: &Config, initial_page: usize, on_page: impl Fn(usize) + 'static) -> Self {
        Self::build(config, initial_page, Rc::new(on_page))
    }

    fn build(config: &Config, initial_page: usize, on_page: Rc<dyn Fn(usize)>) -> Self {
        let boxes = build_pages(config);
        let initial_page = initial_page.min(boxes.len().saturating_sub(1));
        let callback = on_page.clone();
        let pages = PageView::new(boxes)
            .with_controller(PageController::new(initial_page, config.viewport_fraction))
            .on_page_changed(move |page| callback(page));

        Self {
            pages,
            viewport: Size::ZERO,
            page_duration: Duration::from_millis(config.page_duration_ms),
            curve: config.curve,
            press: None,
            tracker: VelocityTracker::default(),
            on_page,
        }
    }

    /// Swaps in a new configuration, staying on the current page.
    pub fn reload(&mut self, config: &Config) {
        let page = self.current_page();
        let viewport = self.viewport;
        *self = Self::build(config, page, self.on_page.clone());
        self.resize(viewport.width, viewport.height);
    }

    pub fn page_count(&self) -> usize {
        self.pages.page_count().unwrap_or(0)
    }

    /// Fractional page, once sized.
    pub fn page(&self) -> Option<f64> {
        self.pages.page()
    }

    pub fn current_page(&self) -> usize {
        self.page().map_or_else(
            || self.pages.controller().initial_page(),
            |page| page.round().max(0.0) as usize,
        )
    }

    pub fn page_box(&self, index: usize) -> Option<&SectorBox> {
        self.pages.child(index)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        let viewport = Size::new(width, height);
        if viewport == self.viewport || width <= 0.0 || height <= 0.0 {
            return;
        }
        log::debug!("viewport resized to {width}x{height}");
        self.viewport = viewport;
        self.pages.layout(width);
        self.layout_visible();
    }

    fn layout_visible(&mut self) {
        let height = self.viewport.height;
        for page in self.pages.visible_pages() {
            if let Some(sector_box) = self.pages.child_mut(page.index) {
                sector_box.flush_layout(BoxConstraints::loose(Size::new(page.extent, height)));
            }
        }
    }

    /// Top-left corner of a page's box, centred in the page's strip.
    fn box_origin(&self, page: &VisiblePage, size: Size) -> Point {
        Point::new(
            page.offset + (page.extent - size.width) / 2.0,
            (self.viewport.height - size.height) / 2.0,
        )
    }

    /// Page under `position` and the position relative to that page's box.
    fn page_hit(&self, position: Point) -> Option<(usize, Point)> {
        self.pages
            .visible_pages()
            .into_iter()
            .find(|page| position.x >= page.offset && position.x < page.offset + page.extent)
            .and_then(|page| {
                let sector_box = self.pages.child(page.index)?;
                let origin = self.box_origin(&page, sector_box.size());
                Some((page.index, position.translate(-origin.x, -origin.y)))
            })
    }

    /// Feeds one pointer sample in window coordinates at time `now`.
    /// Returns whether the scene needs repainting.
    pub fn pointer(&mut self, phase: PointerPhase, position: Point, now: Duration) -> bool {
        match phase {
            PointerPhase::Down => self.pointer_down(position, now),
            PointerPhase::Move => self.pointer_move(position, now),
            PointerPhase::Up => self.pointer_up(position, now),
        }
    }

    fn pointer_down(&mut self, position: Point, now: Duration) -> bool {
        self.release();
        self.layout_visible();
        self.tracker.reset();
        self.tracker.add(now, position.x);

        let Some((page, local)) = self.page_hit(position) else {
            self.press = Some(Press {
                page: self.current_page(),
                origin: position,
                last: position,
                paths: Vec::new(),
                dragging: false,
            });
            return false;
        };

        let mut result = HitTestResult::new();
        let paths: Vec<NodePath> = match self.pages.child(page) {
            Some(sector_box) if sector_box.hit_test(&mut result, local) => {
                result.sector_paths().cloned().collect()
            }
            _ => Vec::new(),
        };
        if let Some(sector_box) = self.pages.child_mut(page) {
            for path in &paths {
                sector_box.dispatch(PointerEvent::Down, path);
            }
        }
        log::trace!("press on page {page} hit {} sectors", paths.len());

        let hit = !paths.is_empty();
        self.press = Some(Press {
            page,
            origin: position,
            last: position,
            paths,
            dragging: false,
        });
        hit
    }

    fn pointer_move(&mut self, position: Point, now: Duration) -> bool {
        let Some(press) = &self.press else {
            return false;
        };
        self.tracker.add(now, position.x);

        let start_drag = !press.dragging && (position.x - press.origin.x).abs() > DRAG_SLOP;
        if start_drag {
            self.release();
            self.pages.drag_start();
        }
        let Some(press) = &mut self.press else {
            return false;
        };
        if start_drag {
            press.dragging = true;
            press.last = press.origin;
        }
        if !press.dragging {
            return false;
        }

        let delta = position.x - press.last.x;
        press.last = position;
        self.pages.drag_update(delta);
        true
    }

    fn pointer_up(&mut self, position: Point, now: Duration) -> bool {
        let Some(press) = self.press.take() else {
            return false;
        };
        self.tracker.add(now, position.x);

        if press.dragging {
            let velocity = self.tracker.velocity();
            log::trace!("drag released at {velocity:.0}px/s");
            self.pages.drag_end(velocity);
            return true;
        }
        self.release_press(press)
    }

    /// Lifts the highlights of the current press, keeping the press itself.
    fn release(&mut self) {
        if let Some(press) = &mut self.press {
            let paths = std::mem::take(&mut press.paths);
            let page = press.page;
            if let Some(sector_box) = self.pages.child_mut(page) {
                for path in &paths {
                    sector_box.dispatch(PointerEvent::Up, path);
                }
            }
        }
    }

    fn release_press(&mut self, press: Press) -> bool {
        let Some(sector_box) = self.pages.child_mut(press.page) else {
            return false;
        };
        for path in &press.paths {
            sector_box.dispatch(PointerEvent::Up, path);
        }
        !press.paths.is_empty()
    }

    /// Advances page motion to frame time `now`. Returns whether more frames
    /// are needed.
    pub fn tick(&mut self, now: Duration) -> bool {
        let animating = self.pages.tick(now);
        self.layout_visible();
        animating
    }

    pub fn is_dragging(&self) -> bool {
        self.press.as_ref().is_some_and(|press| press.dragging)
    }

    pub fn needs_paint(&self) -> bool {
        self.pages.visible_pages().iter().any(|page| {
            self.pages
                .child(page.index)
                .is_some_and(SectorBox::needs_paint)
        })
    }

    pub fn next_page(&self) -> Result<AnimationHandle, PagerError> {
        let page = self.pages.controller().page()?.round() as usize;
        if page + 1 >= self.page_count() {
            return Ok(AnimationHandle::completed(AnimationOutcome::Completed));
        }
        self.pages
            .controller()
            .animate_to_page(page + 1, self.page_duration, self.curve)
    }

    pub fn previous_page(&self) -> Result<AnimationHandle, PagerError> {
        let page = self.pages.controller().page()?.round() as usize;
        if page == 0 {
            return Ok(AnimationHandle::completed(AnimationOutcome::Completed));
        }
        self.pages
            .controller()
            .animate_to_page(page - 1, self.page_duration, self.curve)
    }

    /// Paints every visible page, each clipped to its strip of the viewport.
    pub fn draw(&mut self, cr: &Context) -> Result<(), cairo::Error> {
        self.layout_visible();
        let visible = self.pages.visible_pages();
        for page in &visible {
            let Some(sector_box) = self.pages.child(page.index) else {
                continue;
            };
            let origin = self.box_origin(page, sector_box.size());
            cr.save()?;
            cr.rectangle(page.offset, 0.0, page.extent, self.viewport.height);
            cr.clip();
            let painted = sector_box.paint(cr, origin);
            cr.restore()?;
            painted?;
        }
        for page in &visible {
            if let Some(sector_box) = self.pages.child_mut(page.index) {
                sector_box.mark_painted();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const FRAME: Duration = Duration::from_millis(16);

    fn red() -> Srgba<f64> {
        Srgba::new(1.0, 0.0, 0.0, 1.0)
    }

    fn disc_config(pages: usize) -> Config {
        let page = SectorConfig {
            kind: NodeKind::Solid,
            padding: 0.0,
            delta_radius: None,
            delta_theta: None,
            color: Some(red().into()),
            children: Vec::new(),
        };
        Config {
            inner_radius: 10.0,
            highlight: Srgba::new(0.0, 0.0, 1.0, 1.0).into(),
            pages: vec![page; pages],
            ..Config::default()
        }
    }

    fn recorded(config: &Config) -> (Scene, Rc<RefCell<Vec<usize>>>) {
        let shown = Rc::new(RefCell::new(Vec::new()));
        let sink = shown.clone();
        let mut scene = Scene::new(config, 0, move |page| sink.borrow_mut().push(page));
        scene.resize(200.0, 200.0);
        (scene, shown)
    }

    fn settle(scene: &mut Scene) {
        let mut now = Duration::ZERO;
        while scene.tick(now) {
            now += FRAME;
            assert!(now < Duration::from_secs(10), "scene never settled");
        }
    }

    fn disc_color(scene: &Scene, page: usize) -> Option<Srgba<f64>> {
        scene.page_box(page)?.child()?.decoration().color
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_velocity_tracker() {
        let mut tracker = VelocityTracker::default();
        assert_eq!(tracker.velocity(), 0.0);

        tracker.add(ms(0), 0.0);
        tracker.add(ms(10), -10.0);
        tracker.add(ms(20), -20.0);
        assert_eq!(tracker.velocity(), -1000.0);

        tracker.add(ms(200), -30.0);
        assert_eq!(tracker.velocity(), 0.0);

        tracker.reset();
        tracker.add(ms(0), 0.0);
        tracker.add(ms(10), 500.0);
        assert_eq!(tracker.velocity(), MAX_FLING_VELOCITY);
    }

    #[test]
    fn test_build_sector_converts_degrees() {
        let config = SectorConfig {
            kind: NodeKind::Solid,
            padding: 0.0,
            delta_radius: Some(30.0),
            delta_theta: Some(90.0),
            color: None,
            children: Vec::new(),
        };
        let mut node = build_sector(&config, red(), Srgba::new(0.0, 1.0, 0.0, 1.0));
        node.layout(sector::SectorConstraints::with_max(100.0, sector::TWO_PI));
        assert_eq!(node.delta_radius(), 30.0);
        assert!((node.delta_theta() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(node.decoration().color, Some(Srgba::new(0.0, 1.0, 0.0, 1.0)));
    }

    #[test]
    fn test_press_highlights_sector() {
        let (mut scene, _) = recorded(&disc_config(1));
        assert_eq!(scene.page_box(0).map(SectorBox::size), Some(Size::square(200.0)));

        assert!(scene.pointer(PointerPhase::Down, Point::new(150.0, 100.0), ms(0)));
        assert_eq!(disc_color(&scene, 0), Some(Srgba::new(0.0, 0.0, 1.0, 1.0)));

        assert!(scene.pointer(PointerPhase::Up, Point::new(150.0, 100.0), ms(50)));
        assert_eq!(disc_color(&scene, 0), Some(red()));
    }

    #[test]
    fn test_press_inside_hole_hits_nothing() {
        let (mut scene, _) = recorded(&disc_config(1));
        assert!(!scene.pointer(PointerPhase::Down, Point::new(104.0, 100.0), ms(0)));
        assert_eq!(disc_color(&scene, 0), Some(red()));
        assert!(!scene.pointer(PointerPhase::Up, Point::new(104.0, 100.0), ms(10)));
    }

    #[test]
    fn test_drag_fling_turns_page() {
        let (mut scene, shown) = recorded(&disc_config(3));

        scene.pointer(PointerPhase::Down, Point::new(150.0, 100.0), ms(0));
        assert!(!scene.pointer(PointerPhase::Move, Point::new(145.0, 100.0), ms(8)));
        assert!(!scene.is_dragging());

        assert!(scene.pointer(PointerPhase::Move, Point::new(130.0, 100.0), ms(16)));
        assert!(scene.is_dragging());
        assert_eq!(disc_color(&scene, 0), Some(red()));
        assert_eq!(scene.page(), Some(0.1));

        scene.pointer(PointerPhase::Move, Point::new(40.0, 100.0), ms(32));
        scene.pointer(PointerPhase::Up, Point::new(40.0, 100.0), ms(48));
        settle(&mut scene);

        assert_eq!(scene.page(), Some(1.0));
        assert_eq!(*shown.borrow(), vec![1]);
    }

    #[test]
    fn test_draw_paints_visible_page() {
        let (mut scene, _) = recorded(&disc_config(2));
        let mut surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 200, 200).unwrap();
        {
            let cr = Context::new(&surface).unwrap();
            scene.draw(&cr).unwrap();
        }
        assert!(!scene.needs_paint());

        surface.flush();
        let stride = surface.stride() as usize;
        let data = surface.data().unwrap();
        let pixel = |x: usize, y: usize| {
            let i = y * stride + x * 4;
            u32::from_ne_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]])
        };
        assert_eq!(pixel(150, 100), 0xffff0000);
        assert_eq!(pixel(100, 100), 0);
        assert_eq!(pixel(2, 2), 0);
    }

    #[test]
    fn test_next_and_previous_page() {
        let (mut scene, shown) = recorded(&disc_config(2));

        let handle = scene.next_page().unwrap();
        settle(&mut scene);
        assert_eq!(handle.outcome(), Some(AnimationOutcome::Completed));
        assert_eq!(scene.current_page(), 1);

        let handle = scene.next_page().unwrap();
        assert_eq!(handle.outcome(), Some(AnimationOutcome::Completed));

        scene.previous_page().unwrap();
        settle(&mut scene);
        assert_eq!(scene.current_page(), 0);
        assert_eq!(*shown.borrow(), vec![1, 0]);
    }

    #[test]
    fn test_page_turn_before_resize_errors() {
        let scene = Scene::new(&disc_config(2), 0, |_| {});
        assert!(matches!(scene.next_page(), Err(PagerError::NotLaidOut)));
    }

    #[test]
    fn test_reload_keeps_page() {
        let (mut scene, _) = recorded(&disc_config(3));
        scene.pages.controller().jump_to_page(2).unwrap();
        settle(&mut scene);

        scene.reload(&disc_config(4));
        assert_eq!(scene.page_count(), 4);
        assert_eq!(scene.page(), Some(2.0));

        scene.reload(&disc_config(1));
        assert_eq!(scene.page(), Some(0.0));
    }

    #[test]
    fn test_embedded_pages_lay_out() {
        let config = Config::embedded().unwrap();
        let mut scene = Scene::new(&config, 0, |_| {});
        scene.resize(640.0, 480.0);
        let size = scene.page_box(0).unwrap().size();
        assert!(size.width <= 480.0 && size.width > 0.0);
        assert!(!scene.page_box(0).unwrap().needs_layout());
    }
}
