//! Utilities that are used across the `readprep` subcommands.

pub mod args;
pub mod atomic;
pub mod display;
pub mod formats;
pub mod histogram;
pub mod pathbuf;
