//! Endpoint behavior over the full actix service, with a mock store.

mod support;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use backend::entities::games::{self, GameState};
use backend::routes;
use backend::state::app_state::AppState;
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use serde_json::Value;

async fn service(
    conn: DatabaseConnection,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = actix_web::dev::ServiceResponse,
    Error = actix_web::Error,
> {
    let app_state = AppState::new(conn);
    test::init_service(
        App::new()
            .app_data(web::Data::new(app_state))
            .configure(routes::configure),
    )
    .await
}

#[actix_web::test]
async fn create_game_returns_created_lobby() {
    let game = support::game_model(1, "AB12CD", GameState::Lobby, 1);
    let player = support::player_model(10, 1, "Alice", support::fixed_time());

    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<games::Model>::new(), vec![game]])
        .append_query_results([vec![player]])
        .into_connection();
    let app = service(conn).await;

    let req = test::TestRequest::post()
        .uri("/api/games")
        .set_json(serde_json::json!({ "display_name": "Alice" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["state"], "LOBBY");
    assert_eq!(body["current_round"], 1);
    assert_eq!(body["join_code"], "AB12CD");
    assert_eq!(body["players"].as_array().unwrap().len(), 1);
    assert_eq!(body["players"][0]["name"], "Alice");
    assert_eq!(body["roster_unavailable"], false);
}

#[actix_web::test]
async fn join_with_unknown_code_is_404_problem_json() {
    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<games::Model>::new()])
        .into_connection();
    let app = service(conn).await;

    let req = test::TestRequest::post()
        .uri("/api/games/join")
        .set_json(serde_json::json!({ "code": "ZZZZZZ", "display_name": "Bob" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details_from_service_response(
        resp,
        "GAME_NOT_FOUND",
        StatusCode::NOT_FOUND,
        Some("ZZZZZZ"),
    )
    .await;
}

#[actix_web::test]
async fn join_with_blank_code_is_400_without_store_access() {
    let conn = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = service(conn).await;

    let req = test::TestRequest::post()
        .uri("/api/games/join")
        .set_json(serde_json::json!({ "code": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details_from_service_response(
        resp,
        "JOIN_CODE_REQUIRED",
        StatusCode::BAD_REQUEST,
        None,
    )
    .await;
}

#[actix_web::test]
async fn get_lobby_returns_roster_in_join_order() {
    let game = support::game_model(1, "AB12CD", GameState::Lobby, 1);
    let alice = support::player_model(1, 1, "Alice", support::fixed_time());
    let bob = support::player_model(2, 1, "Bob", support::fixed_time());

    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        // extractor existence check, then snapshot fetch inside the txn
        .append_query_results([vec![game.clone()], vec![game]])
        .append_query_results([vec![alice, bob]])
        .into_connection();
    let app = service(conn).await;

    let req = test::TestRequest::get()
        .uri("/api/games/1/lobby")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["game_id"], 1);
    assert_eq!(body["players"][0]["name"], "Alice");
    assert_eq!(body["players"][1]["name"], "Bob");
}

#[actix_web::test]
async fn end_turn_returns_the_new_round() {
    let game = support::game_model(1, "AB12CD", GameState::Playing, 1);
    let updated = support::game_model(1, "AB12CD", GameState::Playing, 2);

    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        // extractor existence check
        .append_query_results([vec![game]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        // refetch after the atomic increment
        .append_query_results([vec![updated]])
        .into_connection();
    let app = service(conn).await;

    let req = test::TestRequest::post()
        .uri("/api/games/1/end_turn")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["game_id"], 1);
    assert_eq!(body["round"], 2);
}

#[actix_web::test]
async fn non_positive_game_id_is_rejected_before_the_store() {
    let conn = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = service(conn).await;

    let req = test::TestRequest::get().uri("/api/games/0/lobby").to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details_from_service_response(
        resp,
        "INVALID_GAME_ID",
        StatusCode::BAD_REQUEST,
        Some("positive"),
    )
    .await;
}

#[actix_web::test]
async fn unknown_game_id_is_404_from_the_extractor() {
    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<games::Model>::new()])
        .into_connection();
    let app = service(conn).await;

    let req = test::TestRequest::get()
        .uri("/api/games/42/roster")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_problem_details_from_service_response(
        resp,
        "GAME_NOT_FOUND",
        StatusCode::NOT_FOUND,
        Some("42"),
    )
    .await;
}

#[actix_web::test]
async fn roster_failure_degrades_to_unavailable_not_error() {
    let game = support::game_model(1, "AB12CD", GameState::Lobby, 1);

    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![game]])
        .append_query_errors([sea_orm::DbErr::Custom("connection reset".to_string())])
        .into_connection();
    let app = service(conn).await;

    let req = test::TestRequest::get()
        .uri("/api/games/1/roster")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["unavailable"], true);
    assert_eq!(body["players"].as_array().unwrap().len(), 0);
}
