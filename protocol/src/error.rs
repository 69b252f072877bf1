use sweeptoken_core::GameError;
use thiserror::Error;

use crate::CipherError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error("Expected a {expected} control")]
    UnexpectedControl { expected: &'static str },
    #[error("No cipher configured, flag toggling is unavailable")]
    CipherUnavailable,
    #[error("Player already has a game in progress")]
    AlreadyPlaying,
    #[error("No game in progress for this player")]
    NoSession,
    #[error("Control belongs to a previous game")]
    StaleSession,
}

impl ProtocolError {
    /// Whether the host should acknowledge the interaction without changing anything.
    pub fn is_silent(&self) -> bool {
        match self {
            Self::Game(err) => err.is_caller_error() || *err == GameError::Unauthorized,
            Self::StaleSession => true,
            _ => false,
        }
    }
}

pub type Result<T, E = ProtocolError> = core::result::Result<T, E>;
