//! Inbound event dispatch.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EventRegistry`] | Event → callback set, isolated dispatch |
//! | [`UnknownEventLog`] | Append-only file sink for unrecognized events |

/// Event dispatch registry.
pub mod registry;

/// Unknown-event file sink.
pub mod unknown;

pub use registry::{Callback, EventRegistry};
pub use unknown::UnknownEventLog;
