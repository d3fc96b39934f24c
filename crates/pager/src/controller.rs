use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::animation::AnimationHandle;
use crate::curve::Curve;
use crate::error::PagerError;
use crate::physics::ScrollPhysics;
use crate::position::PagePosition;

pub type SharedPosition = Rc<RefCell<PagePosition>>;

/// Drives the page position of the view it is attached to.
#[derive(Debug)]
pub struct PageController {
    initial_page: usize,
    viewport_fraction: f64,
    position: Option<SharedPosition>,
}

impl Default for PageController {
    fn default() -> Self {
        Self::new(0, 1.0)
    }
}

impl PageController {
    pub fn new(initial_page: usize, viewport_fraction: f64) -> Self {
        assert!(
            viewport_fraction > 0.0,
            "viewport fraction must be positive, got {viewport_fraction}"
        );
        Self {
            initial_page,
            viewport_fraction,
            position: None,
        }
    }

    pub fn initial_page(&self) -> usize {
        self.initial_page
    }

    pub fn viewport_fraction(&self) -> f64 {
        self.viewport_fraction
    }

    /// Changes the page size, keeping the attached view on its current page.
    pub fn set_viewport_fraction(&mut self, viewport_fraction: f64) {
        assert!(
            viewport_fraction > 0.0,
            "viewport fraction must be positive, got {viewport_fraction}"
        );
        self.viewport_fraction = viewport_fraction;
        if let Some(position) = &self.position {
            position.borrow_mut().set_viewport_fraction(viewport_fraction);
        }
    }

    pub fn create_position(&self, physics: Rc<dyn ScrollPhysics>) -> PagePosition {
        PagePosition::new(physics, self.initial_page as f64, self.viewport_fraction)
    }

    pub fn attach(&mut self, position: SharedPosition) {
        position
            .borrow_mut()
            .set_viewport_fraction(self.viewport_fraction);
        self.position = Some(position);
    }

    pub fn detach(&mut self) -> Option<SharedPosition> {
        self.position.take()
    }

    pub fn has_clients(&self) -> bool {
        self.position.is_some()
    }

    fn position(&self) -> Result<&SharedPosition, PagerError> {
        self.position.as_ref().ok_or(PagerError::NotAttached)
    }

    /// Current fractional page.
    pub fn page(&self) -> Result<f64, PagerError> {
        self.position()?
            .borrow()
            .page()
            .ok_or(PagerError::NotLaidOut)
    }

    pub fn jump_to_page(&self, page: usize) -> Result<(), PagerError> {
        let mut position = self.laid_out_position()?.borrow_mut();
        let pixels = position.pixels_from_page(page as f64);
        position.jump_to(pixels);
        Ok(())
    }

    pub fn animate_to_page(
        &self,
        page: usize,
        duration: Duration,
        curve: Curve,
    ) -> Result<AnimationHandle, PagerError> {
        let mut position = self.laid_out_position()?.borrow_mut();
        let pixels = position.pixels_from_page(page as f64);
        log::debug!("animating to page {page} ({pixels}px) over {duration:?} with {curve}");
        Ok(position.animate_to(pixels, duration, curve))
    }

    pub fn next_page(&self, duration: Duration, curve: Curve) -> Result<AnimationHandle, PagerError> {
        let page = self.page()?.round() as usize;
        self.animate_to_page(page + 1, duration, curve)
    }

    /// Animates one page back; stays on the first page.
    pub fn previous_page(
        &self,
        duration: Duration,
        curve: Curve,
    ) -> Result<AnimationHandle, PagerError> {
        let page = self.page()?.round() as usize;
        self.animate_to_page(page.saturating_sub(1), duration, curve)
    }

    fn laid_out_position(&self) -> Result<&SharedPosition, PagerError> {
        let position = self.position()?;
        match position.borrow().metrics() {
            Some(_) => Ok(position),
            None => Err(PagerError::NotLaidOut),
        }
    }
}
