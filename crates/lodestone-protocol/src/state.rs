//! Per-connection protocol state.
//!
//! A connection is always in exactly one [`Phase`]. During `Login` it also
//! carries a [`LoginStage`] tracking how far identity resolution has got.
//!
//! ```text
//!                 ┌──(next_state=1)──→ Status
//!   Handshake ────┤
//!                 └──(next_state=2)──→ Login(AwaitingStart)
//!                                         │ LoginStart
//!                          ┌──────────────┴───────────────┐
//!                          ▼ (velocity)                   ▼ (otherwise)
//!          Login(AwaitingForwardingPayload) ──→ Login(Authenticated)
//!                                                         │ LoginSuccess sent
//!                                                         ▼
//!                                                        Play
//! ```
//!
//! Every method here either performs a legal move or returns
//! [`ProtocolError::InvalidTransition`] and leaves the state untouched.

use std::fmt;

use crate::ProtocolError;

/// Coarse lifecycle stage of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Handshake,
    Status,
    Login,
    Play,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handshake => write!(f, "handshake"),
            Self::Status => write!(f, "status"),
            Self::Login => write!(f, "login"),
            Self::Play => write!(f, "play"),
        }
    }
}

/// The phase a handshake asks to move into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextState {
    Status,
    Login,
}

impl NextState {
    /// Maps the handshake's raw `next_state` field.
    pub fn from_wire(raw: i32) -> Result<Self, ProtocolError> {
        match raw {
            1 => Ok(Self::Status),
            2 => Ok(Self::Login),
            other => Err(ProtocolError::InvalidNextState(other)),
        }
    }

    pub fn to_wire(self) -> i32 {
        match self {
            Self::Status => 1,
            Self::Login => 2,
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            Self::Status => Phase::Status,
            Self::Login => Phase::Login,
        }
    }
}

/// Sub-state of the `Login` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    /// Waiting for the client's `LoginStart`.
    AwaitingStart,
    /// A forwarding request went out; waiting for the proxy's answer to
    /// this message id.
    AwaitingForwardingPayload { message_id: i32 },
    /// Identity resolved; `LoginSuccess` may be sent.
    Authenticated,
}

impl fmt::Display for LoginStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingStart => write!(f, "login(awaiting-start)"),
            Self::AwaitingForwardingPayload { message_id } => {
                write!(f, "login(awaiting-forwarding #{message_id})")
            }
            Self::Authenticated => write!(f, "login(authenticated)"),
        }
    }
}

/// Phase plus login sub-state for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionState {
    phase: Phase,
    login: Option<LoginStage>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionState {
    /// Fresh state for an accepted connection.
    pub fn new() -> Self {
        Self {
            phase: Phase::Handshake,
            login: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// `Some` only while in the `Login` phase.
    pub fn login_stage(&self) -> Option<LoginStage> {
        self.login
    }

    /// Handshake → Status or Login.
    pub fn on_handshake(&mut self, next: NextState) -> Result<(), ProtocolError> {
        if self.phase != Phase::Handshake {
            return Err(self.invalid(next.phase().to_string()));
        }
        self.phase = next.phase();
        self.login = match next {
            NextState::Login => Some(LoginStage::AwaitingStart),
            NextState::Status => None,
        };
        Ok(())
    }

    /// Login(AwaitingStart) → Login(AwaitingForwardingPayload).
    pub fn await_forwarding(&mut self, message_id: i32) -> Result<(), ProtocolError> {
        let target = LoginStage::AwaitingForwardingPayload { message_id };
        match self.login {
            Some(LoginStage::AwaitingStart) => {
                self.login = Some(target);
                Ok(())
            }
            _ => Err(self.invalid(target.to_string())),
        }
    }

    /// Login(AwaitingStart | AwaitingForwardingPayload) → Login(Authenticated).
    pub fn authenticate(&mut self) -> Result<(), ProtocolError> {
        match self.login {
            Some(LoginStage::AwaitingStart)
            | Some(LoginStage::AwaitingForwardingPayload { .. }) => {
                self.login = Some(LoginStage::Authenticated);
                Ok(())
            }
            _ => Err(self.invalid(LoginStage::Authenticated.to_string())),
        }
    }

    /// Login(Authenticated) → Play. Call once `LoginSuccess` has been sent.
    pub fn enter_play(&mut self) -> Result<(), ProtocolError> {
        match self.login {
            Some(LoginStage::Authenticated) => {
                self.phase = Phase::Play;
                self.login = None;
                Ok(())
            }
            _ => Err(self.invalid(Phase::Play.to_string())),
        }
    }

    fn invalid(&self, to: String) -> ProtocolError {
        let from = match self.login {
            Some(stage) => stage.to_string(),
            None => self.phase.to_string(),
        };
        ProtocolError::InvalidTransition { from, to }
    }
}
