use derive_more::Deref;

/// Snapshot of a one-dimensional scroll state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub pixels: f64,
    pub min_scroll_extent: f64,
    pub max_scroll_extent: f64,
    pub viewport_dimension: f64,
}

impl ScrollMetrics {
    pub fn out_of_range(&self) -> bool {
        self.pixels < self.min_scroll_extent || self.pixels > self.max_scroll_extent
    }

    pub fn at_edge(&self) -> bool {
        self.pixels == self.min_scroll_extent || self.pixels == self.max_scroll_extent
    }

    pub fn clamped_pixels(&self) -> f64 {
        self.pixels
            .clamp(self.min_scroll_extent, self.max_scroll_extent)
    }
}

/// Scroll metrics plus the fraction of the viewport one page occupies.
#[derive(Debug, Clone, Copy, PartialEq, Deref)]
pub struct PageMetrics {
    #[deref]
    pub metrics: ScrollMetrics,
    pub viewport_fraction: f64,
}

impl PageMetrics {
    pub fn new(metrics: ScrollMetrics, viewport_fraction: f64) -> Self {
        Self {
            metrics,
            viewport_fraction,
        }
    }

    pub fn page_extent(&self) -> f64 {
        self.viewport_dimension * self.viewport_fraction
    }

    /// Fractional page of the in-range offset; overscroll never reports a page
    /// outside the valid range.
    pub fn page(&self) -> f64 {
        page_from_pixels(
            self.clamped_pixels(),
            self.viewport_dimension,
            self.viewport_fraction,
        )
    }

    pub fn pixels_from_page(&self, page: f64) -> f64 {
        pixels_from_page(page, self.viewport_dimension, self.viewport_fraction)
    }
}

pub fn page_from_pixels(pixels: f64, viewport_dimension: f64, viewport_fraction: f64) -> f64 {
    pixels.max(0.0) / (viewport_dimension * viewport_fraction).max(1.0)
}

pub fn pixels_from_page(page: f64, viewport_dimension: f64, viewport_fraction: f64) -> f64 {
    page * viewport_dimension * viewport_fraction
}
