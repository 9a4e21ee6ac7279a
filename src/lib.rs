//! njsPC client - Async client for the nodejs-poolController server.
//!
//! This library keeps a persistent push channel open to an njsPC server,
//! dispatches its device-state events to your callbacks, and sends
//! commands over the server's HTTP routes.
//!
//! # Architecture
//!
//! The client talks to one controller over two channels:
//!
//! - **Push (Socket.IO)**: Device state changes stream in as named events
//! - **Command (HTTP)**: Full-state fetches, health probes and commands
//!
//! Key design principles:
//!
//! - One [`Client`] owns one push channel plus one background monitor
//! - The monitor probes idle connections and reconnects with bounded retries
//! - Connect failures degrade to "will retry" instead of erroring
//! - Callback panics are isolated and logged
//!
//! # Quick Start
//!
//! ```no_run
//! use njspc::{Client, InboundEvent, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder()
//!         .host("nixie-poolcontroller")
//!         .port(4200)
//!         .build()?;
//!
//!     client.on(InboundEvent::Temps, |data| println!("temps: {data}"));
//!     client.connect().await?;
//!
//!     let state = client.fetch_full_state(None).await?;
//!     println!("Controller state: {state}");
//!
//!     client.set_circuit_state(6, true).await?;
//!     client.async_close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`], [`ClientBuilder`], [`ClientConfig`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`events`] | Callback registry and unknown-event log |
//! | [`protocol`] | Routes, event names, Socket.IO codec |
//! | [`transport`] | Push and HTTP transports |

// ============================================================================
// Modules
// ============================================================================

/// Connection lifecycle, monitor and command channel.
///
/// Use [`Client::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Inbound event dispatch.
pub mod events;

/// Static protocol tables and the push-channel codec.
pub mod protocol;

/// Push and request/response transports.
///
/// The traits here are the seams for substituting transports.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, ClientBuilder, ClientConfig};

// Error types
pub use error::{Error, Result};

// Event types
pub use events::{Callback, EventRegistry, UnknownEventLog};

// Protocol types
pub use protocol::{ApiEndpoint, InboundEvent};

// Transport types
pub use transport::{
    HttpResponse, HttpTransport, Method, PushHandlers, PushTransport, ReqwestTransport,
    SocketIoFactory, SocketIoTransport, TransportFactory,
};
