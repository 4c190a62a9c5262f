//! Lobby service behavior against a mock store.

mod support;

use backend::entities::games::{self, GameState};
use backend::errors::domain::{DomainError, NotFoundKind};
use backend::services::lobby::{self, RosterView};
use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
use time::macros::datetime;

#[tokio::test]
async fn create_session_starts_in_lobby_with_creator_seated() {
    let game = support::game_model(1, "AB12CD", GameState::Lobby, 1);
    let player = support::player_model(10, 1, "Alice", support::fixed_time());

    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        // code availability check, then the insert returning the new row
        .append_query_results([Vec::<games::Model>::new(), vec![game]])
        .append_query_results([vec![player]])
        .into_connection();

    let (game, player) = lobby::create_session(&conn, Some("Alice")).await.unwrap();

    assert_eq!(game.state, GameState::Lobby);
    assert_eq!(game.current_round, 1);
    assert_eq!(game.join_code.len(), 6);
    assert_eq!(player.game_id, game.id);
    assert_eq!(player.name, "Alice");
}

#[tokio::test]
async fn create_session_draws_a_fresh_code_when_taken() {
    let taken = support::game_model(5, "TAKEN1", GameState::Lobby, 1);
    let created = support::game_model(6, "FRESH2", GameState::Lobby, 1);
    let player = support::player_model(11, 6, "Alice", support::fixed_time());

    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        // first draw collides, second is free and inserts
        .append_query_results([vec![taken], Vec::<games::Model>::new(), vec![created]])
        .append_query_results([vec![player]])
        .into_connection();

    let (game, _player) = lobby::create_session(&conn, Some("Alice")).await.unwrap();
    assert_eq!(game.id, 6);
}

#[tokio::test]
async fn join_session_normalizes_the_code_before_lookup() {
    let game = support::game_model(1, "AB12CD", GameState::Lobby, 1);
    let player = support::player_model(12, 1, "Bob", support::fixed_time());

    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![game]])
        .append_query_results([vec![player]])
        .into_connection();

    let (game, player) = lobby::join_session(&conn, "  ab12cd \n", Some("Bob"))
        .await
        .unwrap();
    assert_eq!(game.id, 1);
    assert_eq!(player.name, "Bob");

    // The lookup must have used the normalized, uppercase code.
    let log = format!("{:?}", conn.into_transaction_log());
    assert!(log.contains("AB12CD"), "expected normalized code in query log: {log}");
    assert!(!log.contains("ab12cd"), "raw lowercase code leaked into query: {log}");
}

#[tokio::test]
async fn join_session_unknown_code_is_not_found_and_seats_nobody() {
    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<games::Model>::new()])
        .into_connection();

    let err = lobby::join_session(&conn, "ZZZZZZ", Some("Bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Game, _)));

    let log = format!("{:?}", conn.into_transaction_log());
    assert!(!log.contains("INSERT"), "no player row may be written: {log}");
}

#[tokio::test]
async fn join_session_blank_code_is_validation_without_touching_the_store() {
    let conn = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let err = lobby::join_session(&conn, "   ", Some("Bob")).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let log = conn.into_transaction_log();
    assert!(log.is_empty(), "blank code must short-circuit before any query");
}

#[tokio::test]
async fn start_session_moves_to_playing() {
    let updated = support::game_model(1, "AB12CD", GameState::Playing, 1);

    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .append_query_results([vec![updated]])
        .into_connection();

    let game = lobby::start_session(&conn, 1).await.unwrap();
    assert_eq!(game.state, GameState::Playing);
}

#[tokio::test]
async fn advance_round_returns_the_incremented_round() {
    let updated = support::game_model(1, "AB12CD", GameState::Playing, 2);

    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .append_query_results([vec![updated]])
        .into_connection();

    let game = lobby::advance_round(&conn, 1).await.unwrap();
    assert_eq!(game.current_round, 2);

    // The increment must happen inside the UPDATE itself, not read-modify-write.
    let log = format!("{:?}", conn.into_transaction_log());
    assert!(log.contains("current_round"), "round column missing from update: {log}");
}

#[tokio::test]
async fn advance_round_unknown_session_is_not_found() {
    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let err = lobby::advance_round(&conn, 99).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Game, _)));
}

#[tokio::test]
async fn roster_preserves_join_order() {
    let first = support::player_model(1, 1, "Alice", datetime!(2026-03-01 12:00:00 UTC));
    let second = support::player_model(2, 1, "Bob", datetime!(2026-03-01 12:00:05 UTC));

    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![first, second]])
        .into_connection();

    let view = lobby::roster(&conn, 1).await;
    let RosterView::Loaded(players) = view else {
        panic!("expected a loaded roster");
    };
    let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Alice", "Bob"]);
}

#[tokio::test]
async fn roster_degrades_to_unavailable_on_store_failure() {
    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("connection reset by peer".to_string())])
        .into_connection();

    let view = lobby::roster(&conn, 1).await;
    assert_eq!(view, RosterView::Unavailable);
}
