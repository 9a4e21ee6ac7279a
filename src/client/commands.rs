//! Command/query channel.
//!
//! Request/response calls against the controller's HTTP routes. Every call
//! except [`Client::test_connection`] requires a connected push channel and
//! refreshes activity on success.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::time::timeout;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::protocol::ApiEndpoint;
use crate::transport::{HttpResponse, Method};

use super::core::{Client, ClientInner};

/// Statuses `send_command` accepts.
const ACCEPTED_STATUSES: [u16; 3] = [200, 201, 202];

// ============================================================================
// ClientInner - Requests
// ============================================================================

impl ClientInner {
    /// Issues one request bounded by `limit`, labelling timeouts with
    /// `operation`.
    async fn exchange(
        &self,
        operation: &str,
        method: Method,
        url: &str,
        body: Option<&Value>,
        limit: Duration,
    ) -> Result<HttpResponse> {
        match timeout(limit, self.http.request(method, url, body, limit)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) if e.is_timeout() => Err(Error::connection_timeout(operation, limit)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::connection_timeout(operation, limit)),
        }
    }

    /// Returns `true` if `GET state/status` answers 200 within `limit`.
    pub(crate) async fn test_connection(&self, limit: Duration) -> bool {
        let Ok(base) = self.base_url().await else {
            return false;
        };
        let url = format!("{base}/{}", ApiEndpoint::StateStatus);

        match self
            .exchange("test_connection", Method::Get, &url, None, limit)
            .await
        {
            Ok(response) => response.status == 200,
            Err(e) => {
                debug!(url, error = %e, "Connection test failed");
                false
            }
        }
    }
}

// ============================================================================
// Client - Generic Commands
// ============================================================================

impl Client {
    /// Fetches the full controller state from `state/all`.
    ///
    /// `limit` defaults to the configured request timeout. A null or empty
    /// body yields an empty object.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the push channel is down
    /// - [`Error::ConnectionTimeout`] if no response arrives in time
    /// - [`Error::Connection`] for transport failures, non-200 statuses
    ///   and non-JSON bodies
    pub async fn fetch_full_state(&self, limit: Option<Duration>) -> Result<Value> {
        let inner = &self.inner;
        inner.ensure_connected()?;
        let limit = limit.unwrap_or(inner.config.request_timeout);

        let url = format!("{}/{}", inner.base_url().await?, ApiEndpoint::StateAll);
        debug!(url, "Fetching full state");

        let response = inner
            .exchange("fetch_full_state", Method::Get, &url, None, limit)
            .await?;

        if response.status != 200 {
            return Err(Error::connection(format!(
                "HTTP {}: Failed to fetch state from {url}",
                response.status
            )));
        }

        let state = if response.text().trim().is_empty() {
            Value::Null
        } else {
            response.json().map_err(|e| {
                error!(url, error = %e, "Failed to fetch full state");
                Error::connection(format!("Failed to fetch full state: {e}"))
            })?
        };
        let state = match state {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        inner.touch();
        Ok(state)
    }

    /// Sends `data` to `endpoint` with `PUT` and the configured timeout.
    ///
    /// # Errors
    ///
    /// See [`Client::send_command_with`].
    pub async fn send_command(&self, endpoint: ApiEndpoint, data: Option<Value>) -> Result<Value> {
        self.send_command_with(endpoint, data, Method::Put, None)
            .await
    }

    /// Sends `data` to `endpoint` with an explicit method and timeout.
    ///
    /// Statuses 200, 201 and 202 succeed. A body that is not JSON is
    /// returned as `{"response": <text>}`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the push channel is down
    /// - [`Error::InvalidArgument`] if `data` is not a JSON object
    /// - [`Error::ConnectionTimeout`] if no response arrives in time
    /// - [`Error::Connection`] for transport failures and rejected statuses
    pub async fn send_command_with(
        &self,
        endpoint: ApiEndpoint,
        data: Option<Value>,
        method: Method,
        limit: Option<Duration>,
    ) -> Result<Value> {
        let inner = &self.inner;
        inner.ensure_connected()?;
        let limit = limit.unwrap_or(inner.config.request_timeout);

        if let Some(data) = &data
            && !data.is_object()
        {
            return Err(Error::invalid_argument(format!(
                "Data must be a JSON object, got {}",
                json_kind(data)
            )));
        }

        let url = format!("{}/{endpoint}", inner.base_url().await?);
        debug!(%method, url, data = ?data, "Sending command");

        let response = inner
            .exchange("send_command", method, &url, data.as_ref(), limit)
            .await?;

        if !ACCEPTED_STATUSES.contains(&response.status) {
            return Err(Error::connection(format!(
                "HTTP {}: Command failed at {url}. Response: {}",
                response.status,
                response.text()
            )));
        }

        let result = response
            .json()
            .unwrap_or_else(|_| json!({ "response": response.text() }));
        debug!(%result, "Command response");

        inner.touch();
        Ok(result)
    }

    /// Serializes `data` and sends it to `endpoint` with `PUT`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `data` does not serialize to a JSON
    ///   object
    /// - otherwise as [`Client::send_command_with`]
    pub async fn send_command_json<T>(&self, endpoint: ApiEndpoint, data: &T) -> Result<Value>
    where
        T: Serialize + ?Sized,
    {
        self.inner.ensure_connected()?;
        let value = serde_json::to_value(data).map_err(|e| {
            Error::invalid_argument(format!("Data could not be serialized to JSON: {e}"))
        })?;
        let data = (!value.is_null()).then_some(value);
        self.send_command(endpoint, data).await
    }

    /// Returns `true` if the controller answers `state/status` with 200.
    ///
    /// Works whether or not the push channel is connected and never fails.
    pub async fn test_connection(&self, limit: Duration) -> bool {
        self.inner.test_connection(limit).await
    }
}

// ============================================================================
// Client - Convenience Commands
// ============================================================================

impl Client {
    /// Turns a circuit on or off.
    ///
    /// # Errors
    ///
    /// See [`Client::send_command_with`].
    pub async fn set_circuit_state(&self, id: u32, state: bool) -> Result<Value> {
        self.command(ApiEndpoint::CircuitSetState, json!({ "id": id, "state": state }))
            .await
    }

    /// Turns a feature on or off.
    ///
    /// # Errors
    ///
    /// See [`Client::send_command_with`].
    pub async fn set_feature_state(&self, id: u32, state: bool) -> Result<Value> {
        self.command(ApiEndpoint::FeatureSetState, json!({ "id": id, "state": state }))
            .await
    }

    /// Turns a circuit group on or off.
    ///
    /// # Errors
    ///
    /// See [`Client::send_command_with`].
    pub async fn set_circuit_group_state(&self, id: u32, state: bool) -> Result<Value> {
        self.command(
            ApiEndpoint::CircuitGroupSetState,
            json!({ "id": id, "state": state }),
        )
        .await
    }

    /// Turns a light group on or off.
    ///
    /// # Errors
    ///
    /// See [`Client::send_command_with`].
    pub async fn set_light_group_state(&self, id: u32, state: bool) -> Result<Value> {
        self.command(
            ApiEndpoint::LightGroupSetState,
            json!({ "id": id, "state": state }),
        )
        .await
    }

    /// Selects a light theme for a circuit.
    ///
    /// # Errors
    ///
    /// See [`Client::send_command_with`].
    pub async fn set_circuit_theme(&self, id: u32, theme: u32) -> Result<Value> {
        self.command(ApiEndpoint::CircuitSetTheme, json!({ "id": id, "theme": theme }))
            .await
    }

    /// Sets a body's heat setpoint.
    ///
    /// # Errors
    ///
    /// See [`Client::send_command_with`].
    pub async fn set_body_setpoint(&self, id: u32, setpoint: f64) -> Result<Value> {
        self.command(
            ApiEndpoint::TemperatureSetpoint,
            json!({ "id": id, "setPoint": setpoint }),
        )
        .await
    }

    /// Sets a body's heat mode.
    ///
    /// # Errors
    ///
    /// See [`Client::send_command_with`].
    pub async fn set_body_heat_mode(&self, id: u32, mode: u32) -> Result<Value> {
        self.command(ApiEndpoint::SetHeatMode, json!({ "id": id, "mode": mode }))
            .await
    }

    /// Sets the chlorinator output percentage for the pool.
    ///
    /// # Errors
    ///
    /// See [`Client::send_command_with`].
    pub async fn set_chlorinator_pool_setpoint(&self, id: u32, percent: u8) -> Result<Value> {
        self.command(
            ApiEndpoint::ChlorinatorPoolSetpoint,
            json!({ "id": id, "setPoint": percent }),
        )
        .await
    }

    /// Sets the chlorinator output percentage for the spa.
    ///
    /// # Errors
    ///
    /// See [`Client::send_command_with`].
    pub async fn set_chlorinator_spa_setpoint(&self, id: u32, percent: u8) -> Result<Value> {
        self.command(
            ApiEndpoint::ChlorinatorSpaSetpoint,
            json!({ "id": id, "setPoint": percent }),
        )
        .await
    }

    /// Starts or stops super-chlorination.
    ///
    /// # Errors
    ///
    /// See [`Client::send_command_with`].
    pub async fn set_super_chlorinate(&self, id: u32, enabled: bool) -> Result<Value> {
        self.command(
            ApiEndpoint::SuperChlorinate,
            json!({ "id": id, "superChlorinate": enabled }),
        )
        .await
    }

    /// Runs a named light command (e.g. `colorsync`) on a light.
    ///
    /// # Errors
    ///
    /// See [`Client::send_command_with`].
    pub async fn run_light_command(&self, id: u32, command: &str) -> Result<Value> {
        self.command(
            ApiEndpoint::LightRunCommand,
            json!({ "id": id, "command": command }),
        )
        .await
    }

    /// Reads a configuration route with `GET`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `endpoint` is not a configuration read
    /// - otherwise as [`Client::send_command_with`]
    pub async fn get_config(&self, endpoint: ApiEndpoint) -> Result<Value> {
        self.inner.ensure_connected()?;
        if !endpoint.is_config_read() {
            return Err(Error::invalid_argument(format!(
                "{endpoint} is not a configuration route"
            )));
        }
        self.send_command_with(endpoint, None, Method::Get, None)
            .await
    }

    /// Fails fast when disconnected, then sends with `PUT`.
    async fn command(&self, endpoint: ApiEndpoint, data: Value) -> Result<Value> {
        self.inner.ensure_connected()?;
        self.send_command(endpoint, Some(data)).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Tests
// ============================================================================
