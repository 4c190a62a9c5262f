use std::sync::Arc;
use std::time::Duration;

use rand::random;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::state::app_state::AppState;
use crate::ws::hub::WsRegistry;
use crate::ws::protocol::Topic;
use crate::ws::session::HubEvent;

/// Which table a change event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    Games,
    Players,
}

/// Row-level operation a change event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// Envelope published to the session channel whenever a write commits.
/// Carries no row data; subscribers refetch what they need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: ChangeTable,
    pub op: ChangeOp,
    pub game_id: i64,
}

pub struct RealtimeBroker {
    redis_url: String,
    registry: Arc<WsRegistry>,
    publisher: Mutex<ConnectionManager>,
}

impl RealtimeBroker {
    pub async fn connect(redis_url: &str, registry: Arc<WsRegistry>) -> Result<Self, AppError> {
        let client =
            Client::open(redis_url).map_err(|err| AppError::config(format!("Invalid REDIS_URL: {err}")))?;

        let manager = ConnectionManager::new(client).await.map_err(|err| {
            AppError::internal(
                ErrorCode::ConfigError,
                format!("Unable to initialize Redis connection manager: {err}"),
            )
        })?;

        Ok(Self {
            redis_url: redis_url.to_string(),
            registry,
            publisher: Mutex::new(manager),
        })
    }

    /// Start the background subscription loop for this process.
    pub fn spawn_subscriber(self: Arc<Self>) {
        let redis_url = self.redis_url.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move {
            run_subscription_loop_with_retry(&redis_url, registry).await;
        });
    }

    /// Publish a change event to the session channel, with a short bounded
    /// retry for transient failures.
    pub async fn publish(&self, event: &ChangeEvent) -> Result<(), AppError> {
        let encoded = serde_json::to_string(event).map_err(|err| {
            AppError::internal(
                ErrorCode::InternalError,
                format!("Failed to serialize change event: {err}"),
            )
        })?;
        let channel = format!("game:{}", event.game_id);

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let publish_res = {
                let mut publisher = self.publisher.lock().await;
                publisher
                    .publish::<_, _, ()>(channel.clone(), encoded.clone())
                    .await
            };

            match publish_res {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if attempt >= PUBLISHER_MAX_ATTEMPTS {
                        return Err(AppError::internal(
                            ErrorCode::InternalError,
                            format!("Failed to publish change event to Redis: {err}"),
                        ));
                    }

                    let delay_ms = PUBLISHER_INITIAL_RETRY_DELAY_MS
                        .saturating_mul(2_u64.pow(attempt - 1))
                        .min(PUBLISHER_MAX_RETRY_DELAY_MS);
                    warn!(
                        error = %err,
                        attempt,
                        retry_delay_ms = delay_ms,
                        "Redis publish failed, retrying"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

/// Publish a change event if a broker is attached, degrading to a log line
/// when it is not (single-process deployments without Redis) or when the
/// publish itself fails. The triggering write has already committed, so a
/// feed failure must not fail the request.
pub async fn publish_change(state: &AppState, table: ChangeTable, op: ChangeOp, game_id: i64) {
    let event = ChangeEvent { table, op, game_id };
    match state.broker() {
        Some(broker) => {
            if let Err(err) = broker.publish(&event).await {
                warn!(error = %err, ?event, "change event publish failed");
            }
        }
        None => debug!(?event, "no broker attached, change event dropped"),
    }
}

// Subscriber retry configuration (background task)
const INITIAL_RETRY_DELAY_SECS: u64 = 1;
const MAX_RETRY_DELAY_SECS: u64 = 60;
const RETRY_DELAY_MULTIPLIER: f64 = 2.0;
const JITTER_PERCENT: f64 = 0.2;

// Publisher retry configuration (HTTP request path)
const PUBLISHER_MAX_ATTEMPTS: u32 = 3;
const PUBLISHER_INITIAL_RETRY_DELAY_MS: u64 = 50;
const PUBLISHER_MAX_RETRY_DELAY_MS: u64 = 200;

fn calculate_retry_delay(attempt: u32) -> Duration {
    let base_delay =
        INITIAL_RETRY_DELAY_SECS as f64 * RETRY_DELAY_MULTIPLIER.powi(attempt as i32 - 1);
    let capped_delay = base_delay.min(MAX_RETRY_DELAY_SECS as f64);

    let jitter_range = capped_delay * JITTER_PERCENT;
    let jitter = (random::<f64>() * 2.0 - 1.0) * jitter_range;
    let final_delay = (capped_delay + jitter).max(0.1);

    Duration::from_secs_f64(final_delay)
}

async fn run_subscription_loop_with_retry(redis_url: &str, registry: Arc<WsRegistry>) {
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match run_subscription_loop(redis_url, registry.clone()).await {
            Ok(()) => {
                info!("Redis subscription loop completed normally");
                break;
            }
            Err(err) => {
                let delay = calculate_retry_delay(attempt);
                warn!(
                    error = %err,
                    attempt,
                    retry_delay_secs = delay.as_secs_f64(),
                    "Redis subscription failed, retrying"
                );
                sleep(delay).await;

                // Cap the backoff growth without letting the counter overflow.
                if attempt >= 20 {
                    attempt = 10;
                }
            }
        }
    }
}

async fn run_subscription_loop(redis_url: &str, registry: Arc<WsRegistry>) -> Result<(), AppError> {
    let client = Client::open(redis_url).map_err(|err| {
        AppError::internal(
            ErrorCode::ConfigError,
            format!("Failed to create Redis client: {err}"),
        )
    })?;

    let mut pubsub = client.get_async_pubsub().await.map_err(|err| {
        AppError::internal(
            ErrorCode::ConfigError,
            format!("Failed to connect to Redis for subscription: {err}"),
        )
    })?;

    pubsub.psubscribe("game:*").await.map_err(|err| {
        AppError::internal(
            ErrorCode::ConfigError,
            format!("Failed to subscribe to Redis channel pattern game:*: {err}"),
        )
    })?;

    info!("Redis subscription established, processing messages");

    let mut stream = pubsub.into_on_message();

    while let Some(msg) = stream.next().await {
        let Ok(channel) = msg.get_channel::<String>() else {
            continue;
        };
        let Ok(payload) = msg.get_payload::<String>() else {
            continue;
        };

        let event: ChangeEvent = match serde_json::from_str(&payload) {
            Ok(event) => event,
            Err(err) => {
                error!(
                    error = %err,
                    channel = %channel,
                    "Failed to decode change event payload"
                );
                continue;
            }
        };

        if parse_game_channel(&channel) != Some(event.game_id) {
            warn!(
                channel = %channel,
                game_id = event.game_id,
                "[WS BROKER] change event received on mismatched channel"
            );
        }

        dispatch(&registry, &event);
    }

    warn!("Redis subscription stream ended, connection lost");
    Err(AppError::internal(
        ErrorCode::InternalError,
        "Redis subscription stream ended unexpectedly",
    ))
}

/// Route a decoded change event to subscribed sessions. Only roster-affecting
/// player changes fan out; game-row events are observed but not yet consumed
/// by any client view, so they are just logged.
fn dispatch(registry: &WsRegistry, event: &ChangeEvent) {
    match (event.table, event.op) {
        (ChangeTable::Players, ChangeOp::Insert) | (ChangeTable::Players, ChangeOp::Delete) => {
            let topic = Topic::Game { id: event.game_id };
            registry.broadcast(&topic, HubEvent::RosterChanged { topic: topic.clone() });
        }
        (ChangeTable::Players, ChangeOp::Update) => {
            debug!(game_id = event.game_id, "player update event ignored");
        }
        (ChangeTable::Games, op) => {
            debug!(game_id = event.game_id, ?op, "game change event observed");
        }
    }
}

fn parse_game_channel(channel: &str) -> Option<i64> {
    let mut parts = channel.split(':');
    let prefix = parts.next()?;
    if prefix != "game" {
        return None;
    }
    let id = parts.next()?;
    id.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_game_channel_accepts_only_game_prefix() {
        assert_eq!(parse_game_channel("game:42"), Some(42));
        assert_eq!(parse_game_channel("user:42"), None);
        assert_eq!(parse_game_channel("game:nope"), None);
    }

    #[test]
    fn change_event_round_trip() {
        let event = ChangeEvent {
            table: ChangeTable::Players,
            op: ChangeOp::Insert,
            game_id: 7,
        };
        let encoded = serde_json::to_string(&event).unwrap();
        assert!(encoded.contains("\"players\""));
        assert!(encoded.contains("\"insert\""));
        let decoded: ChangeEvent = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.game_id, 7);
        assert_eq!(decoded.table, ChangeTable::Players);
    }
}
