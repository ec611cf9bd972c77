//! Export session monitoring
//! Streams toolchain output into a session log and drives the export
//! state machine the presentation layer renders from

pub mod events;
pub mod monitor;
pub mod state;
pub mod stream;

pub use events::DisplayEvent;
pub use monitor::{ExportMonitor, MonitorHandle, DEFAULT_POLL_INTERVAL};
pub use state::{ExportActivity, ExportState};
pub use stream::{ChildOutputStream, OutputStream};
