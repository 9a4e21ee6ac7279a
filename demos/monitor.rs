//! Live monitor for an njsPC server.
//!
//! Demonstrates:
//! - Reading client configuration from `NJSPC_*` environment variables
//! - Subscribing to every event, or to pump events only
//! - Sending commands through a convenience wrapper and `send_command`
//!
//! Modes (`EXAMPLE_MODE`):
//! - `monitor_all`: print the name of every event until Ctrl+C
//! - `monitor_pump`: print pump events with their payload until Ctrl+C
//! - `test_http_commands`: switch circuit 2 on, then off
//!
//! Usage:
//!   NJSPC_HOST=nixie-poolcontroller EXAMPLE_MODE=monitor_all cargo run --example monitor
//!   cargo run --example monitor -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::{Context, bail};
use njspc::{ApiEndpoint, Client, ClientConfig, InboundEvent};
use serde_json::json;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_DEMO_HOST: &str = "nixie-poolcontroller";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let debug = std::env::args().any(|a| a == "--debug");
    init_logging(debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env().context("reading NJSPC_* variables")?;
    if std::env::var_os("NJSPC_HOST").is_none() {
        config.host = DEFAULT_DEMO_HOST.to_string();
    }
    println!("Configuration: {config:?}");

    let mode = std::env::var("EXAMPLE_MODE").unwrap_or_else(|_| "monitor_all".to_string());
    let client = Client::builder().config(config).build()?;
    println!(
        "Running {mode} mode with {}:{}",
        client.config().host,
        client.config().port
    );

    let result = match mode.as_str() {
        "monitor_all" => monitor_all(&client).await,
        "monitor_pump" => monitor_pump(&client).await,
        "test_http_commands" => test_http_commands(&client).await,
        other => {
            bail!("unknown EXAMPLE_MODE '{other}' (expected monitor_all, monitor_pump or test_http_commands)")
        }
    };

    client.disconnect().await;
    result
}

// ============================================================================
// Modes
// ============================================================================

async fn monitor_all(client: &Client) -> anyhow::Result<()> {
    client.connect().await?;
    for event in InboundEvent::ALL {
        client.on(event, move |_| println!("Received event: {event}"));
    }
    wait_for_exit().await;
    Ok(())
}

async fn monitor_pump(client: &Client) -> anyhow::Result<()> {
    client.connect().await?;
    client.on(InboundEvent::Pump, |data| {
        println!("Received event: {} | Data: {data}", InboundEvent::Pump);
    });
    wait_for_exit().await;
    Ok(())
}

async fn test_http_commands(client: &Client) -> anyhow::Result<()> {
    client.connect().await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    println!("Testing HTTP commands...");

    println!("1. Setting circuit 2 state to ON using convenience method...");
    let result = client.set_circuit_state(2, true).await?;
    println!("   Result: {result}");

    tokio::time::sleep(Duration::from_secs(5)).await;

    println!("2. Setting circuit 2 state to OFF using direct HTTP command...");
    let result = client
        .send_command(
            ApiEndpoint::CircuitSetState,
            Some(json!({ "id": 2, "state": false })),
        )
        .await?;
    println!("   Result: {result}");

    println!("All HTTP commands completed successfully!");
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn init_logging(debug: bool) {
    let filter = if debug { "njspc=debug" } else { "njspc=info" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

async fn wait_for_exit() {
    println!("Press Ctrl+C to exit...");
    tokio::signal::ctrl_c().await.ok();
}
