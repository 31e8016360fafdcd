//! Viewport anchoring.
//!
//! Keeps the visible region stable across three kinds of list mutation:
//!
//! - append: follow new messages only if the viewer was already at the bottom
//! - prepend: older history spliced in above keeps the current content pinned
//! - channel switch: unconditional reset to the bottom
//!
//! Corrections that depend on layout run from `on_layout_settled`, which the
//! host calls once layout is complete. Bottom-pinning is applied on two
//! consecutive settle passes because late image loads can grow the content
//! after the first one.

use serde::Serialize;
use tracing::{debug, trace};

/// Distance from the bottom, in pixels, that still counts as "at the bottom".
pub const NEAR_BOTTOM_PX: f64 = 100.0;

/// Settle passes that re-apply a scroll-to-bottom.
const BOTTOM_PASSES: u8 = 2;

/// Scrollable container as seen by the anchor.
pub trait Viewport {
    fn scroll_top(&self) -> f64;
    fn scroll_height(&self) -> f64;
    fn client_height(&self) -> f64;
    fn set_scroll_top(&mut self, top: f64);

    fn scroll_to_bottom(&mut self) {
        let bottom = (self.scroll_height() - self.client_height()).max(0.0);
        self.set_scroll_top(bottom);
    }

    fn distance_from_bottom(&self) -> f64 {
        (self.scroll_height() - self.scroll_top() - self.client_height()).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum AnchorState {
    Idle,
    /// Pinning to the bottom on the next `remaining` settle passes.
    AutoScrolling { remaining: u8 },
    /// Older history is being spliced in; holds the height measured before.
    AwaitingPrependSettle { captured_height: f64 },
}

/// Snapshot of the scroll bookkeeping, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollState {
    pub container_scroll_top: f64,
    pub container_scroll_height: f64,
    pub pending_anchor_height: Option<f64>,
    pub is_near_bottom: bool,
}

#[derive(Debug, Clone)]
pub struct ScrollAnchor {
    state: AnchorState,
    threshold: f64,
    new_content_below: bool,
}

impl Default for ScrollAnchor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollAnchor {
    pub fn new() -> Self {
        Self {
            state: AnchorState::Idle,
            threshold: NEAR_BOTTOM_PX,
            new_content_below: false,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn state(&self) -> AnchorState {
        self.state
    }

    /// Whether the "new messages below" affordance should show.
    pub fn has_new_content_below(&self) -> bool {
        self.new_content_below
    }

    pub fn is_prepend_pending(&self) -> bool {
        matches!(self.state, AnchorState::AwaitingPrependSettle { .. })
    }

    pub fn is_near_bottom<V: Viewport + ?Sized>(&self, viewport: &V) -> bool {
        viewport.distance_from_bottom() <= self.threshold
    }

    pub fn snapshot<V: Viewport + ?Sized>(&self, viewport: &V) -> ScrollState {
        ScrollState {
            container_scroll_top: viewport.scroll_top(),
            container_scroll_height: viewport.scroll_height(),
            pending_anchor_height: match self.state {
                AnchorState::AwaitingPrependSettle { captured_height } => Some(captured_height),
                _ => None,
            },
            is_near_bottom: self.is_near_bottom(viewport),
        }
    }

    /// A message is about to be appended. Call before the list changes.
    ///
    /// Returns true when the viewport will follow the new content.
    pub fn on_append<V: Viewport + ?Sized>(&mut self, viewport: &V) -> bool {
        if self.is_prepend_pending() {
            self.new_content_below = true;
            return false;
        }
        if self.is_near_bottom(viewport) {
            self.state = AnchorState::AutoScrolling {
                remaining: BOTTOM_PASSES,
            };
            true
        } else {
            self.new_content_below = true;
            false
        }
    }

    /// Older history is about to be spliced in above the current content.
    ///
    /// A prepend only starts from `Idle`. Returns false, and captures
    /// nothing, when a prepend is already in flight or a bottom pin (after
    /// an append or a channel switch) has not finished; the request is
    /// dropped.
    pub fn on_prepend_begin<V: Viewport + ?Sized>(&mut self, viewport: &V) -> bool {
        match self.state {
            AnchorState::Idle => {}
            AnchorState::AwaitingPrependSettle { .. } => {
                debug!("Older-history request suppressed: prepend already in flight");
                return false;
            }
            AnchorState::AutoScrolling { .. } => {
                debug!("Older-history request suppressed: bottom pin pending");
                return false;
            }
        }
        self.state = AnchorState::AwaitingPrependSettle {
            captured_height: viewport.scroll_height(),
        };
        true
    }

    /// The prepended content has been laid out. Shifts `scroll_top` by the
    /// height that was added so the previously visible content stays put.
    ///
    /// Returns the applied delta, or `None` when no prepend was pending
    /// (for example after a channel switch cancelled it).
    pub fn on_prepend_end<V: Viewport + ?Sized>(&mut self, viewport: &mut V) -> Option<f64> {
        let AnchorState::AwaitingPrependSettle { captured_height } = self.state else {
            return None;
        };
        self.state = AnchorState::Idle;

        let delta = viewport.scroll_height() - captured_height;
        if delta > 0.0 {
            let top = viewport.scroll_top() + delta;
            viewport.set_scroll_top(top);
            trace!("Prepend anchor correction: +{}px -> {}", delta, top);
        }
        Some(delta)
    }

    /// The older-history request failed or returned nothing.
    pub fn abort_prepend(&mut self) {
        if self.is_prepend_pending() {
            self.state = AnchorState::Idle;
        }
    }

    /// New channel: forget everything and pin to the bottom once laid out.
    pub fn on_channel_switch(&mut self) {
        if self.is_prepend_pending() {
            debug!("Channel switch cancelled pending prepend correction");
        }
        self.state = AnchorState::AutoScrolling {
            remaining: BOTTOM_PASSES,
        };
        self.new_content_below = false;
    }

    /// Layout-complete signal from the host.
    pub fn on_layout_settled<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        if let AnchorState::AutoScrolling { remaining } = self.state {
            viewport.scroll_to_bottom();
            self.new_content_below = false;
            self.state = match remaining.saturating_sub(1) {
                0 => AnchorState::Idle,
                remaining => AnchorState::AutoScrolling { remaining },
            };
        }
    }

    /// The viewer scrolled. Reaching the bottom clears the affordance.
    pub fn on_user_scroll<V: Viewport + ?Sized>(&mut self, viewport: &V) {
        if self.is_near_bottom(viewport) {
            self.new_content_below = false;
        }
    }

    /// The viewer clicked the "new messages" affordance.
    pub fn jump_to_bottom<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        viewport.scroll_to_bottom();
        self.new_content_below = false;
        if !self.is_prepend_pending() {
            self.state = AnchorState::Idle;
        }
    }
}
