//! Connection monitor.
//!
//! One background task per client. Each pass:
//!
//! 1. No activity ever recorded: drop the transport.
//! 2. Connected but idle past the watchdog: probe `state/status`; refresh
//!    activity on success, drop the transport on failure.
//! 3. Not connected: run a retry campaign of up to
//!    `max_reconnect_attempts` reconnects, `reconnect_delay` apart.
//! 4. Sleep until activity would next go stale (at least one second).
//!
//! The task holds only a [`Weak`] reference while it sleeps, so dropping
//! every [`Client`](super::Client) ends it, even mid-campaign.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, warn};

use crate::error::Result;

use super::config::DEFAULT_PROBE_TIMEOUT;
use super::core::ClientInner;

/// Lower bound on the pause between passes.
const MIN_PAUSE: Duration = Duration::from_secs(1);

// ============================================================================
// Task
// ============================================================================

/// Spawns the monitor loop for `inner`.
pub(crate) fn spawn(inner: Weak<ClientInner>) -> JoinHandle<()> {
    tokio::spawn(run(inner))
}

async fn run(weak: Weak<ClientInner>) {
    while let Some(pause) = check(&weak).await {
        debug!(pause_secs = pause.as_secs_f64(), "Connection monitor sleeping");
        sleep(pause).await;
    }
}

/// Upgrades `weak` unless the client is gone or the monitor was stopped.
fn live(weak: &Weak<ClientInner>) -> Option<Arc<ClientInner>> {
    let Some(inner) = weak.upgrade() else {
        debug!("Client dropped, connection monitor exiting");
        return None;
    };
    (!inner.monitor_stopped()).then_some(inner)
}

/// Runs one pass and returns how long to sleep before the next, or `None`
/// once the monitor should exit.
async fn check(weak: &Weak<ClientInner>) -> Option<Duration> {
    let inner = live(weak)?;
    debug!("Connection monitor checking status");
    let watchdog = inner.config.watchdog_timeout;

    match inner.last_activity() {
        None => {
            debug!("Undefined last activity. Forcing reconnect.");
            inner.cleanup_socket().await;
        }
        Some(last) if inner.is_connected() && last.elapsed() > watchdog => {
            debug!(
                watchdog_secs = watchdog.as_secs_f64(),
                "No recent activity, testing HTTP connection"
            );
            if inner.test_connection(DEFAULT_PROBE_TIMEOUT).await {
                debug!("HTTP connection check succeeded");
                inner.touch();
            } else {
                warn!("HTTP connection check failed. Cleaning up socket.");
                inner.cleanup_socket().await;
            }
        }
        Some(_) => {}
    }

    if inner.is_connected() {
        debug!("Connection is healthy");
    } else {
        drop(inner);
        retry_campaign(weak).await?;
    }

    let inner = live(weak)?;
    Some(match inner.last_activity() {
        Some(last) => next_pause(watchdog, last),
        None => watchdog,
    })
}

/// Reconnects until connected or out of attempts.
///
/// The client is only held across each `connect`, never across the
/// `reconnect_delay` pause. Returns `None` once the monitor should exit.
async fn retry_campaign(weak: &Weak<ClientInner>) -> Option<()> {
    let (delay, max, request_timeout) = {
        let inner = live(weak)?;
        inner.reset_reconnect_attempts();
        let config = &inner.config;
        (
            config.reconnect_delay,
            config.max_reconnect_attempts,
            config.request_timeout,
        )
    };

    loop {
        {
            let inner = live(weak)?;
            if inner.is_connected() {
                return Some(());
            }

            let attempts = inner.reconnect_attempts();
            if max.is_some_and(|max| attempts >= max) {
                error!(attempts, "Max reconnect attempts reached. Giving up.");
                return Some(());
            }

            warn!(
                attempt = attempts + 1,
                max = ?max,
                delay_secs = delay.as_secs_f64(),
                "Connection lost. Attempting to reconnect."
            );
        }
        sleep(delay).await;

        let inner = live(weak)?;
        if let Err(e) = reconnect(&inner, request_timeout).await {
            error!(error = %e, "Reconnect attempt failed");
        }
        inner.increment_reconnect_attempts();
    }
}

/// Boxed so the monitor's future type does not depend on `connect`'s,
/// which itself spawns the monitor.
fn reconnect(
    inner: &Arc<ClientInner>,
    timeout: Duration,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
    Box::pin(inner.connect(timeout))
}

/// Time until `last` goes stale, never less than [`MIN_PAUSE`].
fn next_pause(watchdog: Duration, last: Instant) -> Duration {
    watchdog.saturating_sub(last.elapsed()).max(MIN_PAUSE)
}

// ============================================================================
// Tests
// ============================================================================
