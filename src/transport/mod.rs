//! Transport layer.
//!
//! The client talks to the controller through two seams:
//!
//! ```text
//! ┌──────────────────┐      PushTransport (Socket.IO/WS)     ┌────────────┐
//! │                  │◄──────────────────────────────────────│            │
//! │  Client          │        events, connect, disconnect    │   njsPC    │
//! │                  │                                       │ controller │
//! │                  │──────────────────────────────────────►│            │
//! └──────────────────┘      HttpTransport (HTTP + JSON)      └────────────┘
//! ```
//!
//! Both are traits so the lifecycle logic can be driven by in-process
//! doubles; the defaults are [`SocketIoTransport`] and [`ReqwestTransport`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `push` | Push channel trait, handler roles, factory |
//! | `socketio` | Socket.IO over WebSocket implementation |
//! | `http` | Request/response trait and `reqwest` implementation |

// ============================================================================
// Submodules
// ============================================================================

/// Push channel seam.
pub mod push;

/// Socket.IO push transport.
pub mod socketio;

/// Request/response transport.
pub mod http;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use http::{HttpResponse, HttpTransport, Method, ReqwestTransport};
pub use push::{EventHandler, LifecycleHandler, PushHandlers, PushTransport, TransportFactory};
pub use socketio::{SocketIoFactory, SocketIoTransport};
