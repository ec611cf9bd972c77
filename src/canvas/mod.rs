//! Canvas-side display state
//! Overlay settings and the connection message tooltip, modeled without
//! widget code so the presentation layer can render from them

pub mod message_display;
pub mod overlays;

pub use message_display::{ConnectionId, MessageDisplay};
pub use overlays::{EditorMode, OverlayKind, OverlayPopupSlot, OverlaySettings};
