//! SeaORM adapter for the player repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder,
    Set,
};

use crate::entities::players;

pub mod dto;

pub use dto::PlayerCreate;

// Adapter functions return DbErr; the repos layer maps to DomainError via From<DbErr>.

pub async fn create_player<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: PlayerCreate,
) -> Result<players::Model, sea_orm::DbErr> {
    let player_active = players::ActiveModel {
        id: NotSet,
        game_id: Set(dto.game_id),
        name: Set(dto.name),
        created_at: Set(time::OffsetDateTime::now_utc()),
    };

    player_active.insert(conn).await
}

/// All players of a game, ordered by join time ascending. Ties are broken
/// arbitrarily by the store.
pub async fn find_all_by_game<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<Vec<players::Model>, sea_orm::DbErr> {
    players::Entity::find()
        .filter(players::Column::GameId.eq(game_id))
        .order_by_asc(players::Column::CreatedAt)
        .all(conn)
        .await
}
