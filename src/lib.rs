//! Patchlab - Export supervision and canvas overlay services for a visual patching editor

pub mod canvas;
pub mod cli;
pub mod config;
pub mod export;
pub mod exporter;
