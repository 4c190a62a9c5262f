//! DTOs for the players_sea adapter.

/// DTO for inserting a player row. The name is final here; placeholder
/// synthesis for blank input happens in the repos layer.
#[derive(Debug, Clone)]
pub struct PlayerCreate {
    pub game_id: i64,
    pub name: String,
}

impl PlayerCreate {
    pub fn new(game_id: i64, name: impl Into<String>) -> Self {
        Self {
            game_id,
            name: name.into(),
        }
    }
}
