//! DTOs for the games_sea adapter.

use crate::entities::games::GameState;

/// DTO for creating a new game session. New sessions always start in the
/// lobby at round 1; only the join code varies.
#[derive(Debug, Clone)]
pub struct GameCreate {
    pub join_code: String,
}

impl GameCreate {
    pub fn new(join_code: impl Into<String>) -> Self {
        Self {
            join_code: join_code.into(),
        }
    }
}

/// DTO for updating a game's lifecycle state.
#[derive(Debug, Clone)]
pub struct GameSetState {
    pub id: i64,
    pub state: GameState,
}

impl GameSetState {
    pub fn new(id: i64, state: GameState) -> Self {
        Self { id, state }
    }
}
