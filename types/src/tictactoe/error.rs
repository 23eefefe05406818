use thiserror::Error;

use super::{
    ERROR_ALREADY_JOINED, ERROR_GAME_NOT_ACTIVE, ERROR_GAME_NOT_FOUND, ERROR_INSUFFICIENT_FUNDS,
    ERROR_INVALID_BET, ERROR_INVALID_MOVE,
};

/// Why a create, join, or play was rejected. Rejections never mutate state.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("bet must be greater than zero")]
    InvalidBet,
    #[error("invalid move: {0}")]
    InvalidMove(&'static str),
    #[error("game not found")]
    GameNotFound,
    #[error("game already has a second player")]
    AlreadyJoined,
    #[error("game is not active")]
    GameNotActive,
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
}

impl GameError {
    /// Stable numeric code surfaced to clients.
    pub fn code(&self) -> u8 {
        match self {
            Self::InvalidBet => ERROR_INVALID_BET,
            Self::InvalidMove(_) => ERROR_INVALID_MOVE,
            Self::GameNotFound => ERROR_GAME_NOT_FOUND,
            Self::AlreadyJoined => ERROR_ALREADY_JOINED,
            Self::GameNotActive => ERROR_GAME_NOT_ACTIVE,
            Self::InsufficientFunds { .. } => ERROR_INSUFFICIENT_FUNDS,
        }
    }
}
