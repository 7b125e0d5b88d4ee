//! Persistence connection state and the providers that report it.

use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::{HealthError, Result};

/// State of the link between the service and its data store.
///
/// Mirrors the numeric ready-state codes used by the persistence layer:
/// `0` disconnected, `1` connected, `2` connecting, `3` disconnecting.
/// Codes outside that table are reported as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Connecting,
    Disconnecting,
    Unknown,
}

impl ConnectionState {
    /// Maps a ready-state code to a connection state.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Disconnected,
            1 => Self::Connected,
            2 => Self::Connecting,
            3 => Self::Disconnecting,
            _ => Self::Unknown,
        }
    }

    /// Returns the ready-state code, or `None` for `Unknown`.
    pub fn code(self) -> Option<i64> {
        match self {
            Self::Disconnected => Some(0),
            Self::Connected => Some(1),
            Self::Connecting => Some(2),
            Self::Disconnecting => Some(3),
            Self::Unknown => None,
        }
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Connecting => "connecting",
            Self::Disconnecting => "disconnecting",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read access to the persistence layer's current connection state.
///
/// Implementations must be cheap and must not block on I/O: the health
/// endpoint calls this once per request.
pub trait ConnectionStateProvider: Send + Sync {
    /// Returns the current connection state.
    fn connection_state(&self) -> Result<ConnectionState>;
}

impl<T: ConnectionStateProvider + ?Sized> ConnectionStateProvider for Arc<T> {
    fn connection_state(&self) -> Result<ConnectionState> {
        (**self).connection_state()
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    code: i64,
    failure: Option<String>,
}

/// In-process connection state holder.
///
/// The component owning the store connection writes the state; readers see
/// it through `ConnectionStateProvider`. Clones share the same state.
/// Starts out `Disconnected`.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    state: Arc<RwLock<TrackerState>>,
}

impl ConnectionTracker {
    /// Creates a tracker in the `Disconnected` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new connection state.
    pub fn set_state(&self, state: ConnectionState) {
        // Unknown has no code of its own; -1 is outside the table.
        self.set_code(state.code().unwrap_or(-1));
    }

    /// Records a raw ready-state code.
    pub fn set_code(&self, code: i64) {
        let mut state = self.state.write().unwrap();
        let previous = ConnectionState::from_code(state.code);
        state.code = code;
        let current = ConnectionState::from_code(code);
        if previous != current {
            tracing::debug!(from = %previous, to = %current, code, "connection state changed");
        }
    }

    /// Returns the last recorded ready-state code.
    pub fn code(&self) -> i64 {
        self.state.read().unwrap().code
    }

    /// Makes subsequent reads fail with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.state.write().unwrap().failure = Some(message.into());
    }

    /// Clears a failure set by `fail_with`.
    pub fn clear_failure(&self) {
        self.state.write().unwrap().failure = None;
    }
}

impl ConnectionStateProvider for ConnectionTracker {
    fn connection_state(&self) -> Result<ConnectionState> {
        let state = self.state.read().unwrap();
        if let Some(message) = &state.failure {
            return Err(HealthError::ConnectionState(message.clone()));
        }
        Ok(ConnectionState::from_code(state.code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_codes() {
        assert_eq!(ConnectionState::from_code(0), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::from_code(1), ConnectionState::Connected);
        assert_eq!(ConnectionState::from_code(2), ConnectionState::Connecting);
        assert_eq!(ConnectionState::from_code(3), ConnectionState::Disconnecting);
    }

    #[test]
    fn out_of_range_codes_are_unknown() {
        for code in [-1, 4, 99, i64::MAX] {
            assert_eq!(ConnectionState::from_code(code), ConnectionState::Unknown);
        }
    }

    #[test]
    fn codes_round_trip_for_known_states() {
        for code in 0..=3 {
            assert_eq!(ConnectionState::from_code(code).code(), Some(code));
        }
        assert_eq!(ConnectionState::Unknown.code(), None);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&ConnectionState::Disconnecting).unwrap();
        assert_eq!(json, "\"disconnecting\"");
        let json = serde_json::to_string(&ConnectionState::Unknown).unwrap();
        assert_eq!(json, "\"unknown\"");
    }

    #[test]
    fn tracker_starts_disconnected() {
        let tracker = ConnectionTracker::new();
        assert_eq!(
            tracker.connection_state().unwrap(),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn tracker_clones_share_state() {
        let tracker = ConnectionTracker::new();
        let reader = tracker.clone();

        tracker.set_state(ConnectionState::Connected);
        assert_eq!(reader.connection_state().unwrap(), ConnectionState::Connected);

        tracker.set_code(7);
        assert_eq!(reader.code(), 7);
        assert_eq!(reader.connection_state().unwrap(), ConnectionState::Unknown);
    }

    #[test]
    fn tracker_unknown_state_stays_unknown() {
        let tracker = ConnectionTracker::new();
        tracker.set_state(ConnectionState::Unknown);
        assert_eq!(tracker.connection_state().unwrap(), ConnectionState::Unknown);
    }

    #[test]
    fn tracker_failure_is_reported_until_cleared() {
        let tracker = ConnectionTracker::new();
        tracker.fail_with("socket closed");

        let err = tracker.connection_state().unwrap_err();
        assert!(matches!(err, HealthError::ConnectionState(ref msg) if msg == "socket closed"));

        tracker.clear_failure();
        assert!(tracker.connection_state().is_ok());
    }
}
