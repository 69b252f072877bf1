use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Cell index is outside the board")]
    OutOfRange,
    #[error("Game already ended, no new moves are accepted")]
    InvalidState,
    #[error("Malformed game state: {0}")]
    Malformed(&'static str),
    #[error("Game belongs to another player")]
    Unauthorized,
    #[error("Board size must be between 1 and {max}")]
    InvalidSize { max: u8 },
    #[error("Start cell must have no adjacent mines")]
    InvalidStart,
}

impl GameError {
    /// Errors caused by the acting player rather than by the state itself; these never
    /// change the game and are safe to acknowledge silently.
    pub const fn is_caller_error(self) -> bool {
        matches!(self, Self::OutOfRange | Self::InvalidState)
    }
}

pub type Result<T> = core::result::Result<T, GameError>;
