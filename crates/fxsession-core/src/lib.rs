//! Trading-session time engine for fxsession
//!
//! This crate is the heart of fxsession, containing:
//! - DST calendars for the US, Europe and Australia
//! - Session table selection (standard vs daylight)
//! - Per-window evaluation (open, warning, closed) across UTC midnight
//! - Volume curve rotation into the observer's timezone
//! - Alert scheduling with caller-owned dedupe
//!
//! Everything here is synchronous and free of I/O. Hosts drive the engine
//! with a [`TickContext`] and read back immutable snapshots and events.

mod alerts;
mod dst;
mod engine;
mod events;
mod notify;
mod volume;
mod window;

pub use alerts::*;
pub use dst::*;
pub use engine::*;
pub use events::*;
pub use notify::*;
pub use volume::*;
pub use window::*;
