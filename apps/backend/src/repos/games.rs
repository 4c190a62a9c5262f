//! Game repository functions for the domain layer.

use sea_orm::ConnectionTrait;

use crate::adapters::games_sea as games_adapter;
use crate::entities::games::GameState;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::infra::db_errors::map_db_err;

/// Game session domain model, converted from the database model
/// (games::Model) when loaded through repos functions.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub id: i64,
    pub join_code: String,
    pub state: GameState,
    pub current_round: i32,
    pub created_at: time::OffsetDateTime,
    pub updated_at: time::OffsetDateTime,
}

impl From<crate::entities::games::Model> for Game {
    fn from(m: crate::entities::games::Model) -> Self {
        Self {
            id: m.id,
            join_code: m.join_code,
            state: m.state,
            current_round: m.current_round,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Attach the Game kind to RecordNotFound errors from the adapter.
fn map_game_err(e: sea_orm::DbErr) -> DomainError {
    match e {
        sea_orm::DbErr::RecordNotFound(detail) => DomainError::not_found(NotFoundKind::Game, detail),
        other => map_db_err(other),
    }
}

// Free functions, generic over the connection.

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<Option<Game>, DomainError> {
    let game = games_adapter::find_by_id(conn, game_id)
        .await
        .map_err(map_game_err)?;
    Ok(game.map(Game::from))
}

/// Find game by ID or return an error if not found.
pub async fn require_game<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<Game, DomainError> {
    let game = games_adapter::require_game(conn, game_id)
        .await
        .map_err(map_game_err)?;
    Ok(Game::from(game))
}

/// Whether a game with this id exists. Used by the path extractor.
pub async fn exists<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<bool, DomainError> {
    Ok(find_by_id(conn, game_id).await?.is_some())
}

/// Look up a session by its (already normalized, uppercase) join code.
/// Zero matches is `None`, never an error.
pub async fn find_by_join_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    join_code: &str,
) -> Result<Option<Game>, DomainError> {
    let game = games_adapter::find_by_join_code(conn, join_code)
        .await
        .map_err(map_game_err)?;
    Ok(game.map(Game::from))
}

/// Insert a new session with state LOBBY and round 1. A join-code collision
/// surfaces as `Conflict(JoinCodeConflict)` so the caller can regenerate.
pub async fn create_game<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    join_code: &str,
) -> Result<Game, DomainError> {
    let game = games_adapter::create_game(conn, games_adapter::GameCreate::new(join_code))
        .await
        .map_err(map_game_err)?;
    Ok(Game::from(game))
}

/// Write a new lifecycle state and return the updated record for
/// confirmation.
pub async fn set_state<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
    state: GameState,
) -> Result<Game, DomainError> {
    let game = games_adapter::set_state(conn, games_adapter::GameSetState::new(game_id, state))
        .await
        .map_err(map_game_err)?;
    Ok(Game::from(game))
}

/// Bump the round counter by one (atomic at the store) and return the
/// updated record.
pub async fn advance_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<Game, DomainError> {
    let game = games_adapter::advance_round(conn, game_id)
        .await
        .map_err(map_game_err)?;
    Ok(Game::from(game))
}
