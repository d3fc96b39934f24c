use crate::metrics::PageMetrics;

/// Scroll lifecycle events queued by a position for its host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollNotification {
    /// Motion began.
    Start(PageMetrics),
    /// Pixels moved by `delta`.
    Update { metrics: PageMetrics, delta: f64 },
    /// A move was refused past an edge.
    Overscroll {
        metrics: PageMetrics,
        overscroll: f64,
        velocity: f64,
    },
    /// Motion settled.
    End(PageMetrics),
}

impl ScrollNotification {
    pub fn metrics(&self) -> &PageMetrics {
        match self {
            Self::Start(metrics) | Self::End(metrics) => metrics,
            Self::Update { metrics, .. } | Self::Overscroll { metrics, .. } => metrics,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End(_))
    }
}
