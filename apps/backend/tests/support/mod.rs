//! Shared fixtures for integration tests running against a mock store.

use backend::entities::games::{self, GameState};
use backend::entities::players;
use time::macros::datetime;
use time::OffsetDateTime;

pub fn fixed_time() -> OffsetDateTime {
    datetime!(2026-03-01 12:00:00 UTC)
}

pub fn game_model(id: i64, join_code: &str, state: GameState, current_round: i32) -> games::Model {
    games::Model {
        id,
        join_code: join_code.to_string(),
        state,
        current_round,
        created_at: fixed_time(),
        updated_at: fixed_time(),
    }
}

pub fn player_model(id: i64, game_id: i64, name: &str, joined_at: OffsetDateTime) -> players::Model {
    players::Model {
        id,
        game_id,
        name: name.to_string(),
        created_at: joined_at,
    }
}
