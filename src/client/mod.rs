//! njsPC client.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Connection lifecycle, events and commands |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientConfig`] | Immutable session configuration |
//!
//! Internally the client is split into the lifecycle manager (`core`), its
//! connection state (`state`), the background monitor (`monitor`) and the
//! command/query channel (`commands`).
//!
//! # Example
//!
//! ```no_run
//! use njspc::{ApiEndpoint, Client, ClientConfig, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = Client::builder().config(ClientConfig::from_env()?).build()?;
//! client.connect().await?;
//!
//! client.set_circuit_state(6, true).await?;
//! let bodies = client.get_config(ApiEndpoint::ConfigBody).await?;
//! println!("{bodies}");
//!
//! client.async_close().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Session configuration and defaults.
pub mod config;

mod commands;
mod core;
mod monitor;
mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::builder::ClientBuilder;
pub use self::config::ClientConfig;
pub use self::core::Client;
