//! CLI module
//! Argument parsing and command dispatch

pub mod commands;

pub fn run() -> anyhow::Result<()> {
    commands::run()
}
