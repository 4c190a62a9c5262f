//! Lobby orchestration: creating sessions, joining by code, lifecycle
//! transitions, and roster snapshots.
//!
//! Functions are generic over the connection so callers can pass either a
//! pooled connection or an open transaction.

use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;

use crate::entities::games::GameState;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::repos::games as games_repo;
use crate::repos::players as players_repo;
use crate::utils::join_code::generate_join_code;

/// How many fresh join codes we try before giving up on session creation.
/// With a 36^6 code space, more than one retry is already rare.
const MAX_CODE_ATTEMPTS: usize = 5;

/// Roster entry as exposed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

impl From<players_repo::Player> for PlayerInfo {
    fn from(p: players_repo::Player) -> Self {
        Self {
            id: p.id,
            name: p.name,
            joined_at: p.joined_at,
        }
    }
}

/// Outcome of a roster load. A store failure degrades to `Unavailable`
/// instead of failing the whole request, so a session view still renders
/// while the roster is briefly unreadable.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterView {
    Loaded(Vec<PlayerInfo>),
    Unavailable,
}

impl RosterView {
    /// Split into (players, unavailable-flag) for snapshot assembly.
    pub fn into_parts(self) -> (Vec<PlayerInfo>, bool) {
        match self {
            RosterView::Loaded(players) => (players, false),
            RosterView::Unavailable => (Vec::new(), true),
        }
    }
}

/// Everything a lobby screen needs, in one payload.
#[derive(Debug, Clone, Serialize)]
pub struct LobbySnapshot {
    pub game_id: i64,
    pub join_code: String,
    pub state: GameState,
    pub current_round: i32,
    pub players: Vec<PlayerInfo>,
    pub roster_unavailable: bool,
}

impl LobbySnapshot {
    pub fn new(game: &games_repo::Game, roster: RosterView) -> Self {
        let (players, roster_unavailable) = roster.into_parts();
        Self {
            game_id: game.id,
            join_code: game.join_code.clone(),
            state: game.state.clone(),
            current_round: game.current_round,
            players,
            roster_unavailable,
        }
    }
}

/// In-game view payload. Same shape as the lobby snapshot minus the join
/// code, which is only surfaced while gathering players.
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub game_id: i64,
    pub state: GameState,
    pub current_round: i32,
    pub players: Vec<PlayerInfo>,
    pub roster_unavailable: bool,
}

impl GameSnapshot {
    pub fn new(game: &games_repo::Game, roster: RosterView) -> Self {
        let (players, roster_unavailable) = roster.into_parts();
        Self {
            game_id: game.id,
            state: game.state.clone(),
            current_round: game.current_round,
            players,
            roster_unavailable,
        }
    }
}

/// Normalize a join code the way clients type it: surrounding whitespace
/// stripped, letters uppercased.
pub fn normalize_join_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Create a new session in LOBBY state with round 1 and seat the creator.
///
/// Codes are checked for availability before the insert; the unique index on
/// `join_code` remains the backstop for a concurrent taker, in which case the
/// loop draws a fresh code and tries again.
pub async fn create_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    display_name: Option<&str>,
) -> Result<(games_repo::Game, players_repo::Player), DomainError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_join_code();
        if games_repo::find_by_join_code(conn, &code).await?.is_some() {
            continue;
        }
        match games_repo::create_game(conn, &code).await {
            Ok(game) => {
                let player =
                    players_repo::add_player(conn, game.id, display_name.unwrap_or("")).await?;
                return Ok((game, player));
            }
            // Lost the race for this code; draw another.
            Err(DomainError::Conflict(ConflictKind::JoinCodeConflict, _)) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(DomainError::conflict(
        ConflictKind::JoinCodeConflict,
        format!("Could not allocate a unique join code after {MAX_CODE_ATTEMPTS} attempts"),
    ))
}

/// Join an existing session by its shareable code.
///
/// The code is normalized before lookup, so `" ab12cd "` finds the session
/// stored as `AB12CD`. An unknown code is `NotFound(Game)`, never an infra
/// error.
pub async fn join_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    raw_code: &str,
    display_name: Option<&str>,
) -> Result<(games_repo::Game, players_repo::Player), DomainError> {
    let code = normalize_join_code(raw_code);
    if code.is_empty() {
        return Err(DomainError::validation("Join code is required"));
    }

    let game = games_repo::find_by_join_code(conn, &code)
        .await?
        .ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Game, format!("No session with code {code}"))
        })?;

    let player = players_repo::add_player(conn, game.id, display_name.unwrap_or("")).await?;
    Ok((game, player))
}

/// Move a session from LOBBY to PLAYING. The transition is idempotent:
/// starting an already started session leaves it in PLAYING.
pub async fn start_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<games_repo::Game, DomainError> {
    games_repo::set_state(conn, game_id, GameState::Playing).await
}

/// Advance the round counter by one and return the updated session.
pub async fn advance_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<games_repo::Game, DomainError> {
    games_repo::advance_round(conn, game_id).await
}

/// Load the roster for a session, join order preserved. Fail-soft: a store
/// error is logged and reported as `Unavailable` rather than propagated.
pub async fn roster<C: ConnectionTrait + Send + Sync>(conn: &C, game_id: i64) -> RosterView {
    match players_repo::list_players(conn, game_id).await {
        Ok(players) => RosterView::Loaded(players.into_iter().map(PlayerInfo::from).collect()),
        Err(e) => {
            warn!(game_id, error = %e, "roster load failed, rendering as unavailable");
            RosterView::Unavailable
        }
    }
}

/// Fetch a session and its roster as a lobby snapshot.
pub async fn lobby_snapshot<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<LobbySnapshot, DomainError> {
    let game = games_repo::require_game(conn, game_id).await?;
    let roster = roster(conn, game_id).await;
    Ok(LobbySnapshot::new(&game, roster))
}

/// Fetch a session and its roster as an in-game snapshot.
pub async fn game_snapshot<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<GameSnapshot, DomainError> {
    let game = games_repo::require_game(conn, game_id).await?;
    let roster = roster(conn, game_id).await;
    Ok(GameSnapshot::new(&game, roster))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_join_code("  ab12cd \n"), "AB12CD");
        assert_eq!(normalize_join_code("AB12CD"), "AB12CD");
    }

    #[test]
    fn roster_view_into_parts() {
        let (players, unavailable) = RosterView::Unavailable.into_parts();
        assert!(players.is_empty());
        assert!(unavailable);

        let (players, unavailable) = RosterView::Loaded(Vec::new()).into_parts();
        assert!(players.is_empty());
        assert!(!unavailable);
    }
}
