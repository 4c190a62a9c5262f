//! Player repository functions for the domain layer.

use sea_orm::ConnectionTrait;
use time::OffsetDateTime;

use crate::adapters::players_sea as players_adapter;
use crate::errors::domain::DomainError;
use crate::infra::db_errors::map_db_err;

/// Roster entry domain model.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: i64,
    pub game_id: i64,
    pub name: String,
    pub joined_at: OffsetDateTime,
}

impl From<crate::entities::players::Model> for Player {
    fn from(m: crate::entities::players::Model) -> Self {
        Self {
            id: m.id,
            game_id: m.game_id,
            name: m.name,
            joined_at: m.created_at,
        }
    }
}

/// Resolve the stored display name: blank input gets a timestamp-based
/// placeholder so every roster row has something to show.
pub fn display_name_or_placeholder(name: &str, now: OffsetDateTime) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let millis = now.unix_timestamp_nanos() / 1_000_000;
        format!("Player {millis}")
    } else {
        trimmed.to_string()
    }
}

/// Insert a player row for a session. Never updated or deleted afterwards.
pub async fn add_player<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
    name: &str,
) -> Result<Player, DomainError> {
    let stored_name = display_name_or_placeholder(name, OffsetDateTime::now_utc());
    let player = players_adapter::create_player(
        conn,
        players_adapter::PlayerCreate::new(game_id, stored_name),
    )
    .await
    .map_err(map_db_err)?;
    Ok(Player::from(player))
}

/// All players of a session, ordered by join time ascending. Fallible; the
/// fail-soft policy for roster rendering lives in the lobby service.
pub async fn list_players<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<Vec<Player>, DomainError> {
    let rows = players_adapter::find_all_by_game(conn, game_id)
        .await
        .map_err(map_db_err)?;
    Ok(rows.into_iter().map(Player::from).collect())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn non_blank_name_is_kept_trimmed() {
        let now = datetime!(2026-01-01 00:00:00 UTC);
        assert_eq!(display_name_or_placeholder("  Alice ", now), "Alice");
    }

    #[test]
    fn blank_name_gets_timestamp_placeholder() {
        let now = datetime!(2026-01-01 00:00:00 UTC);
        let name = display_name_or_placeholder("   ", now);
        assert!(name.starts_with("Player "));
        let millis: i128 = name["Player ".len()..].parse().unwrap();
        assert_eq!(millis, now.unix_timestamp_nanos() / 1_000_000);
    }
}
