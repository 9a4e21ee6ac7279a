//! HTTP command routes exposed by the controller.
//!
//! Callers select a route by variant; raw paths are never built by hand.
//!
//! # Route Groups
//!
//! | Group | Routes |
//! |-------|--------|
//! | State | `state/all`, `state/status` |
//! | Device state | circuit, circuit group, light group, feature `setState` |
//! | Chlorinator | pool/spa setpoint, super-chlorinate |
//! | Body | setpoint, heat mode |
//! | Lights | theme, run command |
//! | Configuration | `config/*`, `heatModes`, `lightThemes`, `lightCommands` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ApiEndpoint
// ============================================================================

/// A fixed command route on the controller's HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiEndpoint {
    /// Full device-state snapshot.
    StateAll,
    /// Lightweight status probe.
    StateStatus,
    /// Turn a circuit on or off.
    CircuitSetState,
    /// Turn a circuit group on or off.
    CircuitGroupSetState,
    /// Turn a light group on or off.
    LightGroupSetState,
    /// Turn a feature on or off.
    FeatureSetState,
    /// Chlorinator pool setpoint.
    ChlorinatorPoolSetpoint,
    /// Chlorinator spa setpoint.
    ChlorinatorSpaSetpoint,
    /// Start or stop super-chlorination.
    SuperChlorinate,
    /// Set a light theme on a circuit.
    CircuitSetTheme,
    /// Body configuration.
    ConfigBody,
    /// Available heat modes.
    HeatModes,
    /// Circuit configuration.
    ConfigCircuit,
    /// Available light themes.
    LightThemes,
    /// Heater options.
    ConfigHeaters,
    /// Chlorinator configuration.
    ConfigChlorinator,
    /// Available light commands.
    LightCommands,
    /// Run a light command.
    LightRunCommand,
    /// Body temperature setpoint.
    TemperatureSetpoint,
    /// Body heat mode.
    SetHeatMode,
    /// Chemistry controller setpoints.
    ChemControllerSetpoint,
    /// Schedule configuration.
    ConfigSchedule,
}

impl ApiEndpoint {
    /// Every known route.
    pub const ALL: [ApiEndpoint; 22] = [
        Self::StateAll,
        Self::StateStatus,
        Self::CircuitSetState,
        Self::CircuitGroupSetState,
        Self::LightGroupSetState,
        Self::FeatureSetState,
        Self::ChlorinatorPoolSetpoint,
        Self::ChlorinatorSpaSetpoint,
        Self::SuperChlorinate,
        Self::CircuitSetTheme,
        Self::ConfigBody,
        Self::HeatModes,
        Self::ConfigCircuit,
        Self::LightThemes,
        Self::ConfigHeaters,
        Self::ConfigChlorinator,
        Self::LightCommands,
        Self::LightRunCommand,
        Self::TemperatureSetpoint,
        Self::SetHeatMode,
        Self::ChemControllerSetpoint,
        Self::ConfigSchedule,
    ];

    /// Returns the route path, relative to the server root.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::StateAll => "state/all",
            Self::StateStatus => "state/status",
            Self::CircuitSetState => "state/circuit/setState",
            Self::CircuitGroupSetState => "state/circuitGroup/setState",
            Self::LightGroupSetState => "state/lightGroup/setState",
            Self::FeatureSetState => "state/feature/setState",
            Self::ChlorinatorPoolSetpoint => "state/chlorinator/poolSetpoint",
            Self::ChlorinatorSpaSetpoint => "state/chlorinator/spaSetpoint",
            Self::SuperChlorinate => "state/chlorinator/superChlorinate",
            Self::CircuitSetTheme => "state/circuit/setTheme",
            Self::ConfigBody => "config/body",
            Self::HeatModes => "heatModes",
            Self::ConfigCircuit => "config/circuit",
            Self::LightThemes => "lightThemes",
            Self::ConfigHeaters => "config/options/heaters",
            Self::ConfigChlorinator => "config/chlorinator",
            Self::LightCommands => "lightCommands",
            Self::LightRunCommand => "state/light/runCommand",
            Self::TemperatureSetpoint => "state/body/setPoint",
            Self::SetHeatMode => "state/body/heatMode",
            Self::ChemControllerSetpoint => "state/chemController",
            Self::ConfigSchedule => "config/schedule",
        }
    }

    /// Returns `true` for read-only configuration routes.
    #[inline]
    #[must_use]
    pub const fn is_config_read(self) -> bool {
        matches!(
            self,
            Self::ConfigBody
                | Self::HeatModes
                | Self::ConfigCircuit
                | Self::LightThemes
                | Self::ConfigHeaters
                | Self::ConfigChlorinator
                | Self::LightCommands
                | Self::ConfigSchedule
        )
    }
}

impl fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use rustc_hash::FxHashSet;

    #[test]
    fn test_paths() {
        assert_eq!(ApiEndpoint::StateAll.path(), "state/all");
        assert_eq!(ApiEndpoint::StateStatus.path(), "state/status");
        assert_eq!(ApiEndpoint::CircuitSetState.path(), "state/circuit/setState");
        assert_eq!(ApiEndpoint::ConfigHeaters.path(), "config/options/heaters");
    }

    #[test]
    fn test_paths_are_unique_and_relative() {
        let paths: FxHashSet<_> = ApiEndpoint::ALL.iter().map(|e| e.path()).collect();
        assert_eq!(paths.len(), ApiEndpoint::ALL.len());
        assert!(paths.iter().all(|p| !p.starts_with('/')));
    }

    #[test]
    fn test_config_reads() {
        assert!(ApiEndpoint::ConfigSchedule.is_config_read());
        assert!(ApiEndpoint::LightThemes.is_config_read());
        assert!(!ApiEndpoint::CircuitSetState.is_config_read());
        assert!(!ApiEndpoint::StateAll.is_config_read());
    }

    #[test]
    fn test_display() {
        assert_eq!(ApiEndpoint::SetHeatMode.to_string(), "state/body/heatMode");
    }
}
