use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::require_db;
use crate::db::txn::SharedTxn;
use crate::error::AppError;
use crate::repos::games as games_repo;
use crate::services::lobby::{self, RosterView};
use crate::state::app_state::AppState;
use crate::ws::hub::WsRegistry;
use crate::ws::protocol::{ClientMsg, ErrorCode, ServerMsg, Topic, PROTOCOL_VERSION};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let conn_id = Uuid::new_v4();
    let registry = app_state.registry();

    // In tests this is injected so websocket handlers can see uncommitted
    // rows. In production it is None.
    let shared_txn = SharedTxn::from_req(&req);

    let session = WsSession::new(conn_id, app_state, registry, shared_txn);
    ws::start(session, &req, stream)
}

/// Event delivered to subscribed sessions when a change-feed message arrives
/// for their topic.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub enum HubEvent {
    RosterChanged { topic: Topic },
}

pub struct WsSession {
    conn_id: Uuid,
    app_state: web::Data<AppState>,
    registry: Arc<WsRegistry>,

    // Transaction-per-test hook (None in production)
    shared_txn: Option<SharedTxn>,

    last_heartbeat: Instant,

    hello_done: bool,
}

impl WsSession {
    fn new(
        conn_id: Uuid,
        app_state: web::Data<AppState>,
        registry: Arc<WsRegistry>,
        shared_txn: Option<SharedTxn>,
    ) -> Self {
        Self {
            conn_id,
            app_state,
            registry,
            shared_txn,
            last_heartbeat: Instant::now(),
            hello_done: false,
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn send_error_and_close(
        &self,
        ctx: &mut ws::WebsocketContext<Self>,
        code: ErrorCode,
        message: impl Into<String>,
    ) {
        let msg = ServerMsg::Error {
            code,
            message: message.into(),
        };
        Self::send_json(ctx, &msg);
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
        ctx.stop();
    }

    fn start_heartbeat(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(conn_id = %actor.conn_id, "[WS SESSION] heartbeat timed out");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }
}

/// Check the subscribed session exists, against the shared test transaction
/// when one is present.
async fn topic_exists(
    shared_txn: Option<&SharedTxn>,
    app_state: &AppState,
    game_id: i64,
) -> Result<bool, AppError> {
    match shared_txn {
        Some(txn) => Ok(games_repo::exists(txn.transaction(), game_id).await?),
        None => Ok(games_repo::exists(require_db(app_state)?, game_id).await?),
    }
}

/// Load the roster for a topic, honoring the shared test transaction.
async fn load_roster(
    shared_txn: Option<&SharedTxn>,
    app_state: &AppState,
    game_id: i64,
) -> Result<RosterView, AppError> {
    match shared_txn {
        Some(txn) => Ok(lobby::roster(txn.transaction(), game_id).await),
        None => Ok(lobby::roster(require_db(app_state)?, game_id).await),
    }
}

fn roster_msg(topic: Topic, view: RosterView) -> ServerMsg {
    let (players, unavailable) = view.into_parts();
    ServerMsg::Roster {
        topic,
        players,
        unavailable,
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, "[WS SESSION] started");
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.registry.unsubscribe_all(self.conn_id);
        info!(conn_id = %self.conn_id, "[WS SESSION] stopped");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();

                let parsed: Result<ClientMsg, _> = serde_json::from_str(&text);
                let Ok(cmd) = parsed else {
                    self.send_error_and_close(ctx, ErrorCode::BadRequest, "Malformed JSON");
                    return;
                };

                match cmd {
                    ClientMsg::Hello { protocol } => {
                        if protocol != PROTOCOL_VERSION {
                            self.send_error_and_close(
                                ctx,
                                ErrorCode::BadProtocol,
                                "Unsupported protocol version",
                            );
                            return;
                        }
                        self.hello_done = true;
                        Self::send_json(
                            ctx,
                            &ServerMsg::HelloAck {
                                protocol: PROTOCOL_VERSION,
                            },
                        );
                    }

                    ClientMsg::Subscribe { topic } => {
                        if !self.hello_done {
                            self.send_error_and_close(
                                ctx,
                                ErrorCode::BadRequest,
                                "Must send hello first",
                            );
                            return;
                        }

                        let Topic::Game { id: game_id } = topic.clone();

                        let app_state = self.app_state.clone();
                        let registry = self.registry.clone();
                        let conn_id = self.conn_id;
                        let shared_txn = self.shared_txn.clone();

                        ctx.spawn(
                            async move {
                                let txn_opt = shared_txn.as_ref();
                                if !topic_exists(txn_opt, &app_state, game_id).await? {
                                    return Ok(None);
                                }
                                let view = load_roster(txn_opt, &app_state, game_id).await?;
                                Ok::<Option<RosterView>, AppError>(Some(view))
                            }
                            .into_actor(self)
                            .map(move |res, _actor, ctx| match res {
                                Ok(Some(view)) => {
                                    let recipient = ctx.address().recipient::<HubEvent>();
                                    registry.subscribe(
                                        Topic::Game { id: game_id },
                                        conn_id,
                                        recipient,
                                    );

                                    // Ordering guarantee: ack then roster
                                    Self::send_json(
                                        ctx,
                                        &ServerMsg::Ack {
                                            message: "subscribed",
                                        },
                                    );
                                    Self::send_json(
                                        ctx,
                                        &roster_msg(Topic::Game { id: game_id }, view),
                                    );
                                }
                                Ok(None) => {
                                    Self::send_json(
                                        ctx,
                                        &ServerMsg::Error {
                                            code: ErrorCode::BadTopic,
                                            message: format!("No session with id {game_id}"),
                                        },
                                    );
                                }
                                Err(err) => {
                                    tracing::error!(
                                        ?err,
                                        game_id,
                                        conn_id = %conn_id,
                                        "[WS SESSION] subscribe failed"
                                    );
                                    ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                                    ctx.stop();
                                }
                            }),
                        );
                    }

                    ClientMsg::Unsubscribe { topic } => {
                        if !self.hello_done {
                            self.send_error_and_close(
                                ctx,
                                ErrorCode::BadRequest,
                                "Must send hello first",
                            );
                            return;
                        }
                        self.registry.unsubscribe(&topic, self.conn_id);
                        Self::send_json(
                            ctx,
                            &ServerMsg::Ack {
                                message: "unsubscribed",
                            },
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                self.send_error_and_close(ctx, ErrorCode::BadRequest, "Binary not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    conn_id = %self.conn_id,
                    error = %err,
                    "[WS SESSION] protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl Handler<HubEvent> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: HubEvent, ctx: &mut Self::Context) -> Self::Result {
        let HubEvent::RosterChanged { topic } = msg;
        let Topic::Game { id: game_id } = topic.clone();

        let app_state = self.app_state.clone();
        let shared_txn = self.shared_txn.clone();

        ctx.spawn(
            async move {
                let txn_opt = shared_txn.as_ref();
                load_roster(txn_opt, &app_state, game_id).await
            }
            .into_actor(self)
            .map(move |res, actor, ctx| match res {
                Ok(view) => {
                    Self::send_json(ctx, &roster_msg(Topic::Game { id: game_id }, view));
                }
                Err(err) => {
                    // Internal failure: close to avoid a "live but broken" session.
                    tracing::error!(
                        ?err,
                        conn_id = %actor.conn_id,
                        game_id,
                        "[WS SESSION] roster refresh failed"
                    );
                    ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                    ctx.stop();
                }
            }),
        );
    }
}
