//! SeaORM adapter for the game repository - generic over ConnectionTrait.

use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, Set};

use crate::entities::games;

pub mod dto;

pub use dto::{GameCreate, GameSetState};

// Adapter functions return DbErr; the repos layer maps to DomainError via From<DbErr>.

/// Helper: apply an update, check rows_affected, then refetch the row.
///
/// Consolidates the repetitive pattern shared by `set_state` and
/// `advance_round`: bump `updated_at`, filter by id, treat zero affected
/// rows as RecordNotFound, and return the updated model. The caller
/// provides a closure that configures entity-specific columns.
async fn update_then_fetch<C, F>(
    conn: &C,
    id: i64,
    configure_update: F,
) -> Result<games::Model, sea_orm::DbErr>
where
    C: ConnectionTrait + Send + Sync,
    F: FnOnce(sea_orm::UpdateMany<games::Entity>) -> sea_orm::UpdateMany<games::Entity>,
{
    let now = time::OffsetDateTime::now_utc();

    let result = configure_update(games::Entity::update_many())
        .col_expr(games::Column::UpdatedAt, Expr::val(now).into())
        .filter(games::Column::Id.eq(id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(sea_orm::DbErr::RecordNotFound("Game not found".to_string()));
    }

    games::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound("Game not found".to_string()))
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<Option<games::Model>, sea_orm::DbErr> {
    games::Entity::find_by_id(game_id).one(conn).await
}

/// Find game by ID or return RecordNotFound error.
///
/// Convenience helper that converts `None` into a DbErr::RecordNotFound,
/// eliminating the repetitive `ok_or_else` pattern when a game must exist.
pub async fn require_game<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<games::Model, sea_orm::DbErr> {
    find_by_id(conn, game_id)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound("Game not found".to_string()))
}

pub async fn find_by_join_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    join_code: &str,
) -> Result<Option<games::Model>, sea_orm::DbErr> {
    games::Entity::find()
        .filter(games::Column::JoinCode.eq(join_code))
        .one(conn)
        .await
}

pub async fn create_game<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: GameCreate,
) -> Result<games::Model, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let game_active = games::ActiveModel {
        id: NotSet,
        join_code: Set(dto.join_code),
        state: Set(games::GameState::Lobby),
        current_round: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
    };

    game_active.insert(conn).await
}

pub async fn set_state<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: GameSetState,
) -> Result<games::Model, sea_orm::DbErr> {
    update_then_fetch(conn, dto.id, |update| {
        update.col_expr(games::Column::State, Expr::val(dto.state).into())
    })
    .await
}

/// Atomically bump `current_round` by one in a single UPDATE statement, then
/// refetch. Concurrent callers each land their increment; none is lost.
pub async fn advance_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: i64,
) -> Result<games::Model, sea_orm::DbErr> {
    update_then_fetch(conn, game_id, |update| {
        update.col_expr(
            games::Column::CurrentRound,
            Expr::col(games::Column::CurrentRound).add(1),
        )
    })
    .await
}
