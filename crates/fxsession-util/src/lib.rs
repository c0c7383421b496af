//! Shared utilities for fxsession
//!
//! This crate provides:
//! - Hour arithmetic (UTC <-> fixed-offset local, `HH:MM` formatting)
//! - Wall-clock time parsing for calendar timestamps
//! - A UTC clock with mock-time support for development
//! - Identifier newtypes
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
