//! Shared types for fxsession
//!
//! This crate defines the values exchanged between the engine and its hosts:
//! - Session tables (sessions, windows, roles)
//! - DST regions and status
//! - Per-window states and the published engine snapshot
//! - Alert events and notifications
//! - The half-hourly volume curve

mod alerts;
mod snapshot;
mod types;

pub use alerts::*;
pub use snapshot::*;
pub use types::*;

/// Current snapshot format version
pub const API_VERSION: u32 = 1;
