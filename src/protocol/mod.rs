//! Static protocol tables and the push-channel codec.
//!
//! # Protocol Overview
//!
//! The controller exposes two channels:
//!
//! | Channel | Transport | Purpose |
//! |---------|-----------|---------|
//! | Push | Socket.IO over WebSocket | Device state change notifications |
//! | Command | HTTP + JSON | Full-state fetch, status probe, commands |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `endpoint` | Command routes ([`ApiEndpoint`]) |
//! | `event` | Recognized inbound event names ([`InboundEvent`]) |
//! | `packet` | Socket.IO frame codec ([`Packet`]) |

// ============================================================================
// Submodules
// ============================================================================

/// HTTP command routes.
pub mod endpoint;

/// Inbound push event names.
pub mod event;

/// Socket.IO packet codec.
pub mod packet;

// ============================================================================
// Re-exports
// ============================================================================

pub use endpoint::ApiEndpoint;
pub use event::InboundEvent;
pub use packet::Packet;
