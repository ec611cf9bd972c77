//! Connection message tooltip state
//!
//! Models the hover behavior of the connection message display without
//! any widget code: the presentation layer feeds it hover changes, the
//! latest message text, and clock ticks, then renders from its fields.
//!
//! A fresh hover shows after a short delay. Leaving a connection opens a
//! short grace window during which the next hover shows immediately,
//! matching how tooltips chain when the mouse moves between connections.

use std::time::{Duration, Instant};

/// Delay before a fresh hover shows the display
const SHOW_DELAY: Duration = Duration::from_millis(500);

/// After a hide, hovers within this window show without delay
const REUSE_WINDOW: Duration = Duration::from_millis(500);

/// Shown while the hovered connection has not carried a message yet
const NO_MESSAGE: &str = "no message yet";

/// Identifies a connection on the patch canvas
pub type ConnectionId = u64;

/// State of the floating connection message display
#[derive(Debug)]
pub struct MessageDisplay {
    hovered: Option<ConnectionId>,
    text: String,
    width: f32,
    visible: bool,
    /// Deadline for revealing the display while a hover is pending
    show_at: Option<Instant>,
    /// End of the no-delay window armed by the last hide
    reuse_until: Option<Instant>,
    /// A fresh hover lets the width shrink to the new text once
    fresh_hover: bool,
}

impl MessageDisplay {
    pub fn new() -> Self {
        Self {
            hovered: None,
            text: NO_MESSAGE.to_string(),
            width: 0.0,
            visible: false,
            show_at: None,
            reuse_until: None,
            fresh_hover: false,
        }
    }

    /// Hover onto a connection, or off with `None`
    pub fn set_connection(&mut self, now: Instant, connection: Option<ConnectionId>) {
        match connection {
            Some(id) => {
                self.hovered = Some(id);
                self.fresh_hover = true;

                // The reuse window only counts down while not hovering
                let immediate = self.reuse_until.is_some_and(|until| now < until);
                self.reuse_until = None;

                if immediate {
                    self.visible = true;
                    self.show_at = None;
                } else {
                    self.visible = false;
                    self.show_at = Some(now + SHOW_DELAY);
                }
            }
            None => {
                self.hovered = None;
                self.visible = false;
                self.show_at = None;
                // Any successful interaction makes the next one instant
                // for a short while
                self.reuse_until = Some(now + REUSE_WINDOW);
            }
        }
    }

    /// Refresh the message text and its measured width for the hovered
    /// connection. Ignored while nothing is hovered.
    pub fn set_message(&mut self, text: &str, measured_width: f32) {
        if self.hovered.is_none() {
            return;
        }

        self.text = if text.is_empty() {
            NO_MESSAGE.to_string()
        } else {
            text.to_string()
        };

        // Only grow while the same hover lasts, so changing values don't
        // make the display jitter
        if measured_width > self.width || self.fresh_hover {
            self.width = measured_width;
            self.fresh_hover = false;
        }
    }

    /// Advance the timers
    pub fn tick(&mut self, now: Instant) {
        if let Some(at) = self.show_at {
            if now >= at {
                self.show_at = None;
                self.visible = self.hovered.is_some();
            }
        }

        if let Some(until) = self.reuse_until {
            if now >= until {
                self.reuse_until = None;
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn hovered(&self) -> Option<ConnectionId> {
        self.hovered
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Width hint for the presentation layer
    pub fn width(&self) -> f32 {
        self.width
    }
}

impl Default for MessageDisplay {
    fn default() -> Self {
        Self::new()
    }
}
