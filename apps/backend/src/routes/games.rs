//! Session lifecycle and roster HTTP routes.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::db::txn::with_txn;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::game_id::GameId;
use crate::services::lobby::{self, GameSnapshot, LobbySnapshot, PlayerInfo, RosterView};
use crate::state::app_state::AppState;
use crate::ws::broker::{publish_change, ChangeOp, ChangeTable};

#[derive(Debug, Deserialize)]
struct CreateGameRequest {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JoinGameRequest {
    code: String,
    display_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct RosterResponse {
    players: Vec<PlayerInfo>,
    unavailable: bool,
}

#[derive(Debug, Serialize)]
struct RoundResponse {
    game_id: i64,
    round: i32,
}

/// POST /api/games
///
/// Create a new session and seat the caller as its first player. Responds
/// with the full lobby snapshot including the shareable join code.
async fn create_game(
    http_req: HttpRequest,
    body: web::Json<CreateGameRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let display_name = body.into_inner().display_name;

    let snapshot = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            let (game, player) = lobby::create_session(txn, display_name.as_deref()).await?;
            let roster = RosterView::Loaded(vec![PlayerInfo::from(player)]);
            Ok(LobbySnapshot::new(&game, roster))
        })
    })
    .await?;

    publish_change(
        &app_state,
        ChangeTable::Games,
        ChangeOp::Insert,
        snapshot.game_id,
    )
    .await;
    publish_change(
        &app_state,
        ChangeTable::Players,
        ChangeOp::Insert,
        snapshot.game_id,
    )
    .await;

    Ok(HttpResponse::Created().json(snapshot))
}

/// POST /api/games/join
///
/// Join an existing session by its code. The code is normalized before
/// lookup; an unknown code yields 404.
async fn join_game(
    http_req: HttpRequest,
    body: web::Json<JoinGameRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let JoinGameRequest { code, display_name } = body.into_inner();

    if code.trim().is_empty() {
        return Err(AppError::bad_request(
            ErrorCode::JoinCodeRequired,
            "Join code is required",
        ));
    }

    let snapshot = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            let (game, _player) = lobby::join_session(txn, &code, display_name.as_deref()).await?;
            Ok(lobby::lobby_snapshot(txn, game.id).await?)
        })
    })
    .await?;

    publish_change(
        &app_state,
        ChangeTable::Players,
        ChangeOp::Insert,
        snapshot.game_id,
    )
    .await;

    Ok(HttpResponse::Ok().json(snapshot))
}

/// GET /api/games/{game_id}/lobby
async fn get_lobby(
    http_req: HttpRequest,
    game_id: GameId,
    app_state: web::Data<AppState>,
) -> Result<web::Json<LobbySnapshot>, AppError> {
    let id = game_id.0;
    let snapshot = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { Ok(lobby::lobby_snapshot(txn, id).await?) })
    })
    .await?;
    Ok(web::Json(snapshot))
}

/// GET /api/games/{game_id}
async fn get_game(
    http_req: HttpRequest,
    game_id: GameId,
    app_state: web::Data<AppState>,
) -> Result<web::Json<GameSnapshot>, AppError> {
    let id = game_id.0;
    let snapshot = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { Ok(lobby::game_snapshot(txn, id).await?) })
    })
    .await?;
    Ok(web::Json(snapshot))
}

/// GET /api/games/{game_id}/roster
///
/// The roster alone, join order preserved. A store failure degrades to an
/// empty list with `unavailable: true` rather than an error status.
async fn get_roster(
    http_req: HttpRequest,
    game_id: GameId,
    app_state: web::Data<AppState>,
) -> Result<web::Json<RosterResponse>, AppError> {
    let id = game_id.0;
    let view = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { Ok(lobby::roster(txn, id).await) })
    })
    .await?;

    let (players, unavailable) = view.into_parts();
    Ok(web::Json(RosterResponse {
        players,
        unavailable,
    }))
}

/// POST /api/games/{game_id}/start
///
/// Move the session from LOBBY to PLAYING and return the in-game snapshot.
async fn start_game(
    http_req: HttpRequest,
    game_id: GameId,
    app_state: web::Data<AppState>,
) -> Result<web::Json<GameSnapshot>, AppError> {
    let id = game_id.0;
    let snapshot = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move {
            let game = lobby::start_session(txn, id).await?;
            let roster = lobby::roster(txn, id).await;
            Ok(GameSnapshot::new(&game, roster))
        })
    })
    .await?;

    publish_change(&app_state, ChangeTable::Games, ChangeOp::Update, id).await;

    Ok(web::Json(snapshot))
}

/// POST /api/games/{game_id}/end_turn
///
/// Advance the round counter by one. The increment happens in a single
/// statement at the store, so concurrent calls never lose an increment.
async fn end_turn(
    http_req: HttpRequest,
    game_id: GameId,
    app_state: web::Data<AppState>,
) -> Result<web::Json<RoundResponse>, AppError> {
    let id = game_id.0;
    let game = with_txn(Some(&http_req), &app_state, |txn| {
        Box::pin(async move { Ok(lobby::advance_round(txn, id).await?) })
    })
    .await?;

    publish_change(&app_state, ChangeTable::Games, ChangeOp::Update, id).await;

    Ok(web::Json(RoundResponse {
        game_id: game.id,
        round: game.current_round,
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(create_game)));
    cfg.service(web::resource("/join").route(web::post().to(join_game)));
    cfg.service(web::resource("/{game_id}").route(web::get().to(get_game)));
    cfg.service(web::resource("/{game_id}/lobby").route(web::get().to(get_lobby)));
    cfg.service(web::resource("/{game_id}/roster").route(web::get().to(get_roster)));
    cfg.service(web::resource("/{game_id}/start").route(web::post().to(start_game)));
    cfg.service(web::resource("/{game_id}/end_turn").route(web::post().to(end_turn)));
}
