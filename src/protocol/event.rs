//! Inbound push event names.
//!
//! The controller pushes state changes over the event channel as
//! `(name, payload)` pairs. The set of names the client recognizes is
//! closed; anything else is treated as unknown by the dispatcher.
//!
//! | Name | Emitted when |
//! |------|--------------|
//! | `circuit`, `feature`, `virtualCircuit` | Circuit-like devices change |
//! | `circuitGroup`, `lightGroup` | Group state changes |
//! | `body`, `temps` | Body or temperature readings change |
//! | `pump`, `pumpExt`, `filter` | Equipment telemetry |
//! | `chlorinator`, `chemController` | Chemistry equipment |
//! | `controller`, `schedule` | Controller status and schedules |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// InboundEvent
// ============================================================================

/// A recognized inbound event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundEvent {
    /// `circuit`
    Circuit,
    /// `body`
    Body,
    /// `temps`
    Temps,
    /// `chlorinator`
    Chlorinator,
    /// `pump`
    Pump,
    /// `pumpExt`
    PumpExt,
    /// `lightGroup`
    LightGroup,
    /// `circuitGroup`
    CircuitGroup,
    /// `feature`
    Feature,
    /// `controller`
    Controller,
    /// `chemController`
    ChemController,
    /// `filter`
    Filter,
    /// `virtualCircuit`
    VirtualCircuit,
    /// `schedule`
    Schedule,
}

impl InboundEvent {
    /// Every recognized event.
    pub const ALL: [InboundEvent; 14] = [
        Self::Circuit,
        Self::Body,
        Self::Temps,
        Self::Chlorinator,
        Self::Pump,
        Self::PumpExt,
        Self::LightGroup,
        Self::CircuitGroup,
        Self::Feature,
        Self::Controller,
        Self::ChemController,
        Self::Filter,
        Self::VirtualCircuit,
        Self::Schedule,
    ];

    /// Returns the wire name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Circuit => "circuit",
            Self::Body => "body",
            Self::Temps => "temps",
            Self::Chlorinator => "chlorinator",
            Self::Pump => "pump",
            Self::PumpExt => "pumpExt",
            Self::LightGroup => "lightGroup",
            Self::CircuitGroup => "circuitGroup",
            Self::Feature => "feature",
            Self::Controller => "controller",
            Self::ChemController => "chemController",
            Self::Filter => "filter",
            Self::VirtualCircuit => "virtualCircuit",
            Self::Schedule => "schedule",
        }
    }

    /// Looks up a wire name. Matching is exact (case-sensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == name)
    }

    /// Returns `true` if `name` is a recognized event.
    #[inline]
    #[must_use]
    pub fn is_known(name: &str) -> bool {
        Self::from_name(name).is_some()
    }
}

impl fmt::Display for InboundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InboundEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::invalid_argument(format!("Unknown event '{s}'")))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_known_names() {
        assert!(InboundEvent::is_known("pump"));
        assert!(InboundEvent::is_known("pumpExt"));
        assert!(InboundEvent::is_known("chemController"));
        assert!(!InboundEvent::is_known("bogusEvent"));
        assert!(!InboundEvent::is_known("Pump"));
    }

    #[test]
    fn test_every_event_round_trips_by_name() {
        for event in InboundEvent::ALL {
            assert_eq!(InboundEvent::from_name(event.as_str()), Some(event));
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "bogusEvent".parse::<InboundEvent>().unwrap_err();
        assert!(err.to_string().contains("bogusEvent"));
    }

    proptest! {
        #[test]
        fn prop_uppercase_prefixed_names_are_unknown(suffix in "[a-zA-Z]{0,12}") {
            let name = format!("X{suffix}");
            prop_assert!(!InboundEvent::is_known(&name));
        }
    }
}
