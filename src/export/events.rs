//! Worker-to-display messages
//!
//! Export workers never touch display state directly; everything destined
//! for the screen travels over a channel and is applied by the single
//! consumer on the UI-owning side.

/// A message from an export worker to the display model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    /// A chunk of toolchain output to append to the session log
    Output(String),

    /// The export worker paused on a question and is blocked until
    /// the user confirms it
    PromptRequested(String),
}
