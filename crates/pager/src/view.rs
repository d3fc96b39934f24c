//! A horizontal pager: pages laid side by side, one position, snapping physics.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::controller::{PageController, SharedPosition};
use crate::notification::ScrollNotification;
use crate::physics::{ClampingScrollPhysics, PageScrollPhysics, ScrollPhysics};

const MAX_LAYOUT_CYCLES: usize = 10;

type PageBuilder<T> = Box<dyn FnMut(usize) -> T>;

pub enum PageChildren<T> {
    List(Vec<T>),
    /// Pages built on demand while visible. `count` of `None` is unbounded.
    Builder {
        build: PageBuilder<T>,
        count: Option<usize>,
        built: BTreeMap<usize, T>,
    },
}

impl<T> PageChildren<T> {
    pub fn count(&self) -> Option<usize> {
        match self {
            Self::List(pages) => Some(pages.len()),
            Self::Builder { count, .. } => *count,
        }
    }
}

impl<T> fmt::Debug for PageChildren<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(pages) => f.debug_tuple("List").field(&pages.len()).finish(),
            Self::Builder { count, built, .. } => f
                .debug_struct("Builder")
                .field("count", count)
                .field("built", &built.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Placement of a page along the scroll axis, relative to the viewport start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisiblePage {
    pub index: usize,
    pub offset: f64,
    pub extent: f64,
}

pub struct PageView<T> {
    children: PageChildren<T>,
    controller: PageController,
    physics: Rc<dyn ScrollPhysics>,
    position: SharedPosition,
    on_page_changed: Option<Box<dyn FnMut(usize)>>,
    last_reported_page: usize,
}

impl<T> fmt::Debug for PageView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageView")
            .field("children", &self.children)
            .field("controller", &self.controller)
            .field("last_reported_page", &self.last_reported_page)
            .finish_non_exhaustive()
    }
}

impl<T> PageView<T> {
    pub fn new(pages: Vec<T>) -> Self {
        Self::with_children(PageChildren::List(pages))
    }

    pub fn builder(count: Option<usize>, build: impl FnMut(usize) -> T + 'static) -> Self {
        Self::with_children(PageChildren::Builder {
            build: Box::new(build),
            count,
            built: BTreeMap::new(),
        })
    }

    fn with_children(children: PageChildren<T>) -> Self {
        let controller = PageController::default();
        let physics = Self::page_physics(Box::new(ClampingScrollPhysics));
        let position = Rc::new(RefCell::new(controller.create_position(physics.clone())));
        let mut view = Self {
            children,
            last_reported_page: controller.initial_page(),
            controller,
            physics,
            position,
            on_page_changed: None,
        };
        view.controller.attach(view.position.clone());
        view
    }

    fn page_physics(parent: Box<dyn ScrollPhysics>) -> Rc<dyn ScrollPhysics> {
        Rc::new(PageScrollPhysics::apply_to(parent))
    }

    /// Replaces the default controller. The view starts over at the new
    /// controller's initial page.
    pub fn with_controller(mut self, controller: PageController) -> Self {
        self.controller.detach();
        self.controller = controller;
        self.last_reported_page = self.controller.initial_page();
        self.rebuild_position();
        self
    }

    /// Layers page snapping over `physics` instead of clamping.
    pub fn with_physics(mut self, physics: impl ScrollPhysics + 'static) -> Self {
        self.physics = Self::page_physics(Box::new(physics));
        self.rebuild_position();
        self
    }

    pub fn on_page_changed(mut self, callback: impl FnMut(usize) + 'static) -> Self {
        self.on_page_changed = Some(Box::new(callback));
        self
    }

    fn rebuild_position(&mut self) {
        self.position = Rc::new(RefCell::new(
            self.controller.create_position(self.physics.clone()),
        ));
        self.controller.attach(self.position.clone());
    }

    pub fn controller(&self) -> &PageController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PageController {
        &mut self.controller
    }

    pub fn page_count(&self) -> Option<usize> {
        self.children.count()
    }

    /// Current fractional page, once laid out.
    pub fn page(&self) -> Option<f64> {
        self.position.borrow().page()
    }

    /// Sizes the pager to `viewport_dimension`, repeating until the position
    /// accepts the viewport and extents without correcting itself.
    pub fn layout(&mut self, viewport_dimension: f64) {
        let mut settled = false;
        for cycle in 0..MAX_LAYOUT_CYCLES {
            let mut position = self.position.borrow_mut();
            let viewport_settled = position.apply_viewport_dimension(viewport_dimension);
            let extent = viewport_dimension * position.viewport_fraction();
            let max_scroll_extent = match self.children.count() {
                Some(count) => count.saturating_sub(1) as f64 * extent,
                None => f64::INFINITY,
            };
            let content_settled = position.apply_content_dimensions(0.0, max_scroll_extent);
            if viewport_settled && content_settled {
                log::trace!("page view settled after {} layout passes", cycle + 1);
                settled = true;
                break;
            }
        }
        assert!(
            settled,
            "page view did not settle within {MAX_LAYOUT_CYCLES} layout passes"
        );
        self.realize_visible();
        self.dispatch_notifications();
    }

    /// Pages overlapping the viewport, in index order. Pages narrower than the
    /// viewport are centred in it.
    pub fn visible_pages(&self) -> Vec<VisiblePage> {
        let Some(metrics) = self.position.borrow().metrics() else {
            return Vec::new();
        };
        let viewport = metrics.viewport_dimension;
        let extent = metrics.page_extent();
        if extent <= 0.0 {
            return Vec::new();
        }
        let leading = (viewport - extent) / 2.0;
        let first = ((metrics.pixels - leading) / extent).floor().max(0.0) as usize;
        let count = self.children.count().unwrap_or(usize::MAX);

        (first..count)
            .map(|index| VisiblePage {
                index,
                offset: index as f64 * extent - metrics.pixels + leading,
                extent,
            })
            .skip_while(|page| page.offset + page.extent <= 0.0)
            .take_while(|page| page.offset < viewport)
            .collect()
    }

    fn realize_visible(&mut self) {
        let visible: Vec<usize> = self.visible_pages().iter().map(|page| page.index).collect();
        if let PageChildren::Builder { build, built, .. } = &mut self.children {
            built.retain(|index, _| visible.contains(index));
            for index in visible {
                built.entry(index).or_insert_with(|| build(index));
            }
        }
    }

    /// The page at `index`, if it exists and, for built pages, is realized.
    pub fn child(&self, index: usize) -> Option<&T> {
        match &self.children {
            PageChildren::List(pages) => pages.get(index),
            PageChildren::Builder { built, .. } => built.get(&index),
        }
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut T> {
        match &mut self.children {
            PageChildren::List(pages) => pages.get_mut(index),
            PageChildren::Builder { built, .. } => built.get_mut(&index),
        }
    }

    fn is_laid_out(&self) -> bool {
        self.position.borrow().metrics().is_some()
    }

    pub fn drag_start(&mut self) {
        if !self.is_laid_out() {
            return;
        }
        self.position.borrow_mut().begin_drag();
        self.dispatch_notifications();
    }

    /// Moves by a pointer delta along the axis; dragging towards the start
    /// reveals later pages.
    pub fn drag_update(&mut self, delta: f64) {
        if !self.is_laid_out() {
            return;
        }
        self.position.borrow_mut().apply_user_offset(delta);
        self.realize_visible();
        self.dispatch_notifications();
    }

    pub fn drag_end(&mut self, velocity: f64) {
        if !self.is_laid_out() {
            return;
        }
        self.position.borrow_mut().end_drag(velocity);
        self.dispatch_notifications();
    }

    /// Advances animations to frame time `now` and delivers the notifications
    /// queued since the last frame. Returns whether more frames are needed.
    pub fn tick(&mut self, now: Duration) -> bool {
        let animating = self.position.borrow_mut().tick(now);
        self.realize_visible();
        self.dispatch_notifications();
        animating
    }

    fn dispatch_notifications(&mut self) {
        let notifications = self.position.borrow_mut().take_notifications();
        for notification in notifications {
            let ScrollNotification::End(metrics) = notification else {
                continue;
            };
            let page = metrics.page().round() as usize;
            if page == self.last_reported_page {
                continue;
            }
            log::debug!("settled on page {page}");
            self.last_reported_page = page;
            if let Some(callback) = &mut self.on_page_changed {
                callback(page);
            }
        }
    }
}
