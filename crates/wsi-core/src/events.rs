//! Render lifecycle events and the per-frame recompute debounce.
//!
//! The host pushes [`RenderEvent`]s into the controller as its view changes;
//! the engines never poll. Any number of events inside one animation frame
//! collapse into a single pending recompute via [`FrameScheduler`] — the
//! host then drains the flag exactly once per frame.

/// Host lifecycle events that trigger recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEvent {
    /// A slide (or region) was opened.
    Open,
    /// The viewport was updated (pan/zoom/resize).
    Update,
    /// The base layer was redrawn.
    Redraw,
}

/// Debounces recompute triggers to at most one per animation frame.
///
/// # Example
///
/// ```rust
/// use wsi_core::{FrameScheduler, RenderEvent};
///
/// let mut scheduler = FrameScheduler::new();
/// scheduler.request(RenderEvent::Redraw);
/// scheduler.request(RenderEvent::Update);
/// scheduler.request(RenderEvent::Redraw);
///
/// // Three triggers, one recompute.
/// assert!(scheduler.begin_frame());
/// assert!(!scheduler.begin_frame());
/// ```
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: bool,
}

impl FrameScheduler {
    /// Creates an idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a recompute trigger. Idempotent within a frame.
    pub fn request(&mut self, _event: RenderEvent) {
        self.pending = true;
    }

    /// True when a recompute is scheduled for the next frame.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consumes the pending flag at the start of an animation frame.
    ///
    /// Returns whether a recompute should run this frame.
    pub fn begin_frame(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Drops any pending recompute, used on disable/teardown.
    pub fn clear(&mut self) {
        self.pending = false;
    }
}
