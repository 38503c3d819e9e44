//! Meteor Dodge Error Types
//!
//! Centralized error handling for the game loop, screens and persistence.
//! Voice and audio backends report through `anyhow` and are downgraded to
//! warnings, so they never surface here.

use thiserror::Error;

/// Central error type for Meteor Dodge
#[derive(Error, Debug)]
pub enum GameError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("High score file error: {0}")]
    HighScore(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: GameError = io.into();
        assert_eq!(err.to_string(), "gone");
    }

    #[test]
    fn test_messages_name_the_source() {
        let err = GameError::HighScore("'abc' is not a number".into());
        assert_eq!(err.to_string(), "High score file error: 'abc' is not a number");
        let err = GameError::Config("target_fps must be positive".into());
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
