//! Error codes for the Peloton backend API.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses. Add new codes here; never pass ad-hoc
//! strings as error codes.

use core::fmt;

/// Centralized error codes for the Peloton backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request validation
    /// Invalid game ID provided
    InvalidGameId,
    /// Join code missing or blank
    JoinCodeRequired,
    /// General validation error
    ValidationError,

    // Not found
    /// Game not found
    GameNotFound,
    /// Player not found
    PlayerNotFound,
    /// Generic record not found
    RecordNotFound,

    // Conflicts
    /// Generated join code collided with an existing game
    JoinCodeConflict,
    /// Generic conflict
    Conflict,

    // Infrastructure
    /// Database error
    DbError,
    /// Database unavailable
    DbUnavailable,
    /// Configuration error
    ConfigError,
    /// Internal error
    InternalError,
}

impl ErrorCode {
    /// Canonical SCREAMING_SNAKE_CASE representation used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidGameId => "INVALID_GAME_ID",
            ErrorCode::JoinCodeRequired => "JOIN_CODE_REQUIRED",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::GameNotFound => "GAME_NOT_FOUND",
            ErrorCode::PlayerNotFound => "PLAYER_NOT_FOUND",
            ErrorCode::RecordNotFound => "RECORD_NOT_FOUND",
            ErrorCode::JoinCodeConflict => "JOIN_CODE_CONFLICT",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::DbError => "DB_ERROR",
            ErrorCode::DbUnavailable => "DB_UNAVAILABLE",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_screaming_snake_case() {
        let codes = [
            ErrorCode::InvalidGameId,
            ErrorCode::JoinCodeRequired,
            ErrorCode::GameNotFound,
            ErrorCode::JoinCodeConflict,
            ErrorCode::DbUnavailable,
        ];
        for code in codes {
            let s = code.as_str();
            assert!(!s.is_empty());
            assert!(s
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'));
        }
    }
}
