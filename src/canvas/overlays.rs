//! Canvas overlay display settings
//!
//! Tracks which visual annotations (origin marker, workspace border,
//! object index, connection direction) the editor draws in each mode.
//! One bitmask per mode, persisted with the rest of the configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A visual annotation drawn on top of the patch canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Origin,
    Border,
    Index,
    Direction,
}

impl OverlayKind {
    pub const ALL: [OverlayKind; 4] = [
        OverlayKind::Origin,
        OverlayKind::Border,
        OverlayKind::Index,
        OverlayKind::Direction,
    ];

    fn bit(self) -> u32 {
        match self {
            OverlayKind::Origin => 1,
            OverlayKind::Border => 1 << 1,
            OverlayKind::Index => 1 << 2,
            OverlayKind::Direction => 1 << 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OverlayKind::Origin => "Origin",
            OverlayKind::Border => "Border",
            OverlayKind::Index => "Index",
            OverlayKind::Direction => "Direction",
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            OverlayKind::Origin => "0,0 point of canvas",
            OverlayKind::Border => "Plugin / window workspace size",
            OverlayKind::Index => "Object index in patch",
            OverlayKind::Direction => "Direction of connection",
        }
    }

    /// Origin and Border can be toggled in every mode; object and
    /// connection annotations are not offered while a patch is running.
    pub fn available_in(self, mode: EditorMode) -> bool {
        match self {
            OverlayKind::Origin | OverlayKind::Border => true,
            OverlayKind::Index | OverlayKind::Direction => mode != EditorMode::Run,
        }
    }

    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "origin" => Ok(OverlayKind::Origin),
            "border" => Ok(OverlayKind::Border),
            "index" => Ok(OverlayKind::Index),
            "direction" => Ok(OverlayKind::Direction),
            _ => anyhow::bail!("unknown overlay: {}", s),
        }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Editor mode determining which overlays are visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    Edit,
    Lock,
    Run,
    Alt,
}

impl EditorMode {
    pub const ALL: [EditorMode; 4] = [
        EditorMode::Edit,
        EditorMode::Lock,
        EditorMode::Run,
        EditorMode::Alt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EditorMode::Edit => "edit",
            EditorMode::Lock => "lock",
            EditorMode::Run => "run",
            EditorMode::Alt => "alt",
        }
    }

    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "edit" => Ok(EditorMode::Edit),
            "lock" => Ok(EditorMode::Lock),
            "run" => Ok(EditorMode::Run),
            "alt" => Ok(EditorMode::Alt),
            _ => anyhow::bail!("unknown editor mode: {}", s),
        }
    }
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OverlayError {
    #[error("{kind} overlay is not available in {mode} mode")]
    NotAvailable { kind: OverlayKind, mode: EditorMode },
}

/// Which overlays are drawn in each editor mode
///
/// Stored as one bitmask per mode, matching the settings tree the editor
/// persists. Everything starts off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySettings {
    #[serde(default)]
    pub edit: u32,
    #[serde(default)]
    pub lock: u32,
    #[serde(default)]
    pub run: u32,
    #[serde(default)]
    pub alt: u32,
}

impl OverlaySettings {
    fn mask(&self, mode: EditorMode) -> u32 {
        match mode {
            EditorMode::Edit => self.edit,
            EditorMode::Lock => self.lock,
            EditorMode::Run => self.run,
            EditorMode::Alt => self.alt,
        }
    }

    fn mask_mut(&mut self, mode: EditorMode) -> &mut u32 {
        match mode {
            EditorMode::Edit => &mut self.edit,
            EditorMode::Lock => &mut self.lock,
            EditorMode::Run => &mut self.run,
            EditorMode::Alt => &mut self.alt,
        }
    }

    pub fn is_shown(&self, mode: EditorMode, kind: OverlayKind) -> bool {
        self.mask(mode) & kind.bit() != 0
    }

    /// Set one overlay toggle in one mode
    pub fn set(&mut self, mode: EditorMode, kind: OverlayKind, on: bool) -> Result<(), OverlayError> {
        if !kind.available_in(mode) {
            return Err(OverlayError::NotAvailable { kind, mode });
        }

        let mask = self.mask_mut(mode);
        if on {
            *mask |= kind.bit();
        } else {
            *mask &= !kind.bit();
        }
        Ok(())
    }

    /// Flip one overlay toggle, returning its new state
    pub fn toggle(&mut self, mode: EditorMode, kind: OverlayKind) -> Result<bool, OverlayError> {
        let on = !self.is_shown(mode, kind);
        self.set(mode, kind, on)?;
        Ok(on)
    }

    /// Overlays currently shown in a mode, in display order
    pub fn shown_in(&self, mode: EditorMode) -> Vec<OverlayKind> {
        OverlayKind::ALL
            .into_iter()
            .filter(|kind| self.is_shown(mode, *kind))
            .collect()
    }
}

/// Open overlay-settings popup, tracked by whoever launched it
///
/// The launcher holds the slot; a second launch while one popup is live
/// is refused. No process-wide flag is involved.
#[derive(Debug, Default)]
pub struct OverlayPopupSlot {
    open: Option<OverlayPopup>,
}

impl OverlayPopupSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch the popup, or None when one is already open
    pub fn launch(&mut self) -> Option<&mut OverlayPopup> {
        if self.open.is_some() {
            return None;
        }
        self.open = Some(OverlayPopup { _private: () });
        self.open.as_mut()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Dismiss the popup; the slot can launch again afterwards
    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn popup(&mut self) -> Option<&mut OverlayPopup> {
        self.open.as_mut()
    }
}

/// Live overlay-settings popup; toggle interactions route through it
#[derive(Debug)]
pub struct OverlayPopup {
    _private: (),
}

impl OverlayPopup {
    /// Flip one toggle on behalf of the user, returning its new state
    pub fn toggle(
        &mut self,
        settings: &mut OverlaySettings,
        mode: EditorMode,
        kind: OverlayKind,
    ) -> Result<bool, OverlayError> {
        settings.toggle(mode, kind)
    }
}
