//! Connection lifecycle state machine.
//!
//! Both roles drive a connection through the same lifecycle:
//!
//! ```text
//! setup -> preparing -> ready -> handshaking -> established -> cancelled
//!               |          |
//!               +-> waiting-+   (recoverable: no viable network yet)
//!               +-> failed -+-> cancelled   (terminal before cancelled)
//! ```
//!
//! `waiting` is recoverable; `failed` is terminal prior to `cancelled`.
//! Connections are single-use: a client re-initiates by constructing a
//! fresh connection rather than reusing a cancelled one. Transitions are
//! validated explicitly so callers detect illegal jumps.

use thiserror::Error;

/// Lifecycle state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connection object constructed, nothing started.
    Setup,
    /// Resolving and establishing the underlying stream.
    Preparing,
    /// Stream established, handshake not yet begun.
    Ready,
    /// No viable network path; may recover to `Ready`.
    Waiting,
    /// Version strings being exchanged.
    Handshaking,
    /// Handshake complete; framed messages may flow.
    Established,
    /// The connection failed; the only way out is `Cancelled`.
    Failed,
    /// Torn down. Final.
    Cancelled,
}

impl ConnectionState {
    /// Whether framed messages may flow in this state.
    #[must_use]
    pub const fn allows_traffic(&self) -> bool {
        matches!(self, Self::Established)
    }

    /// Whether the connection has reached its final state.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Advances `Setup -> Preparing`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStateError::IllegalTransition`] from any other
    /// state.
    pub fn advance_to_preparing(self) -> Result<Self, ConnectionStateError> {
        self.advance(Self::Preparing, matches!(self, Self::Setup))
    }

    /// Advances to `Ready` from `Preparing`, or back from `Waiting` once a
    /// viable network appears.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStateError::IllegalTransition`] from any other
    /// state.
    pub fn advance_to_ready(self) -> Result<Self, ConnectionStateError> {
        self.advance(
            Self::Ready,
            matches!(self, Self::Preparing | Self::Waiting),
        )
    }

    /// Pauses in `Waiting` from `Preparing` or `Ready`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStateError::IllegalTransition`] from any other
    /// state.
    pub fn advance_to_waiting(self) -> Result<Self, ConnectionStateError> {
        self.advance(
            Self::Waiting,
            matches!(self, Self::Preparing | Self::Ready),
        )
    }

    /// Advances `Ready -> Handshaking`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStateError::IllegalTransition`] from any other
    /// state.
    pub fn advance_to_handshaking(self) -> Result<Self, ConnectionStateError> {
        self.advance(Self::Handshaking, matches!(self, Self::Ready))
    }

    /// Advances `Handshaking -> Established`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStateError::IllegalTransition`] from any other
    /// state.
    pub fn advance_to_established(self) -> Result<Self, ConnectionStateError> {
        self.advance(Self::Established, matches!(self, Self::Handshaking))
    }

    /// Marks the connection failed. Legal from every live state.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStateError::IllegalTransition`] when already
    /// `Failed` or `Cancelled`.
    pub fn fail(self) -> Result<Self, ConnectionStateError> {
        self.advance(
            Self::Failed,
            !matches!(self, Self::Failed | Self::Cancelled),
        )
    }

    /// Tears the connection down. Legal from every state except
    /// `Cancelled` itself.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionStateError::IllegalTransition`] when already
    /// `Cancelled`.
    pub fn cancel(self) -> Result<Self, ConnectionStateError> {
        self.advance(Self::Cancelled, !matches!(self, Self::Cancelled))
    }

    fn advance(self, to: Self, legal: bool) -> Result<Self, ConnectionStateError> {
        if legal {
            Ok(to)
        } else {
            Err(ConnectionStateError::IllegalTransition { from: self, to })
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Setup => "setup",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Waiting => "waiting",
            Self::Handshaking => "handshaking",
            Self::Established => "established",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{name}")
    }
}

/// Error for illegal connection state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConnectionStateError {
    /// Attempted an illegal state transition.
    #[error("illegal connection state transition from {from} to {to}")]
    IllegalTransition {
        /// State the connection was in.
        from: ConnectionState,
        /// State the caller attempted to reach.
        to: ConnectionState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_progression() {
        let state = ConnectionState::Setup
            .advance_to_preparing()
            .unwrap()
            .advance_to_ready()
            .unwrap()
            .advance_to_handshaking()
            .unwrap()
            .advance_to_established()
            .unwrap();
        assert!(state.allows_traffic());

        let state = state.cancel().unwrap();
        assert!(state.is_cancelled());
    }

    #[test]
    fn waiting_is_recoverable() {
        let state = ConnectionState::Setup
            .advance_to_preparing()
            .unwrap()
            .advance_to_waiting()
            .unwrap();
        assert_eq!(state, ConnectionState::Waiting);

        let state = state.advance_to_ready().unwrap();
        assert_eq!(state, ConnectionState::Ready);
    }

    #[test]
    fn failed_only_leads_to_cancelled() {
        let state = ConnectionState::Ready.fail().unwrap();
        assert_eq!(state, ConnectionState::Failed);

        assert!(state.advance_to_ready().is_err());
        assert!(state.advance_to_handshaking().is_err());
        assert!(state.fail().is_err());

        let state = state.cancel().unwrap();
        assert!(state.is_cancelled());
    }

    #[test]
    fn cancelled_is_final() {
        let state = ConnectionState::Established.cancel().unwrap();
        assert!(state.cancel().is_err());
        assert!(state.fail().is_err());
        assert!(state.advance_to_ready().is_err());
    }

    #[test]
    fn handshake_cannot_be_skipped() {
        let err = ConnectionState::Ready.advance_to_established().unwrap_err();
        assert_eq!(
            err,
            ConnectionStateError::IllegalTransition {
                from: ConnectionState::Ready,
                to: ConnectionState::Established,
            }
        );
    }

    #[test]
    fn traffic_requires_established() {
        for state in [
            ConnectionState::Setup,
            ConnectionState::Preparing,
            ConnectionState::Ready,
            ConnectionState::Waiting,
            ConnectionState::Handshaking,
            ConnectionState::Failed,
            ConnectionState::Cancelled,
        ] {
            assert!(!state.allows_traffic(), "{state} must not allow traffic");
        }
    }
}
