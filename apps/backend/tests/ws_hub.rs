//! Registry fan-out semantics for the websocket hub.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix::prelude::*;
use backend::ws::hub::WsRegistry;
use backend::ws::protocol::Topic;
use backend::ws::session::HubEvent;
use uuid::Uuid;

/// Collects every hub event it receives.
struct Probe {
    seen: Arc<Mutex<Vec<Topic>>>,
}

impl Actor for Probe {
    type Context = Context<Self>;
}

impl Handler<HubEvent> for Probe {
    type Result = ();

    fn handle(&mut self, msg: HubEvent, _ctx: &mut Self::Context) -> Self::Result {
        let HubEvent::RosterChanged { topic } = msg;
        self.seen.lock().unwrap().push(topic);
    }
}

fn spawn_probe() -> (Arc<Mutex<Vec<Topic>>>, Recipient<HubEvent>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let addr = Probe { seen: seen.clone() }.start();
    (seen, addr.recipient())
}

async fn settle() {
    // Let actor mailboxes drain.
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[actix_web::test]
async fn broadcast_reaches_only_matching_topic_subscribers() {
    let registry = WsRegistry::new();
    let game_one = Topic::Game { id: 1 };
    let game_two = Topic::Game { id: 2 };

    let (seen_a, probe_a) = spawn_probe();
    let (seen_b, probe_b) = spawn_probe();
    let (seen_c, probe_c) = spawn_probe();

    registry.subscribe(game_one.clone(), Uuid::new_v4(), probe_a);
    registry.subscribe(game_one.clone(), Uuid::new_v4(), probe_b);
    registry.subscribe(game_two.clone(), Uuid::new_v4(), probe_c);

    registry.broadcast(
        &game_one,
        HubEvent::RosterChanged {
            topic: game_one.clone(),
        },
    );
    settle().await;

    assert_eq!(seen_a.lock().unwrap().as_slice(), [game_one.clone()]);
    assert_eq!(seen_b.lock().unwrap().as_slice(), [game_one.clone()]);
    assert!(seen_c.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn unsubscribe_stops_delivery() {
    let registry = WsRegistry::new();
    let topic = Topic::Game { id: 7 };
    let conn_id = Uuid::new_v4();

    let (seen, probe) = spawn_probe();
    registry.subscribe(topic.clone(), conn_id, probe);
    assert_eq!(registry.subscriber_count(&topic), 1);

    registry.unsubscribe(&topic, conn_id);
    assert_eq!(registry.subscriber_count(&topic), 0);

    registry.broadcast(
        &topic,
        HubEvent::RosterChanged {
            topic: topic.clone(),
        },
    );
    settle().await;

    assert!(seen.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn unsubscribe_all_clears_every_topic_for_a_connection() {
    let registry = WsRegistry::new();
    let game_one = Topic::Game { id: 1 };
    let game_two = Topic::Game { id: 2 };
    let conn_id = Uuid::new_v4();

    let (_seen, probe) = spawn_probe();
    registry.subscribe(game_one.clone(), conn_id, probe.clone());
    registry.subscribe(game_two.clone(), conn_id, probe);

    registry.unsubscribe_all(conn_id);

    assert_eq!(registry.subscriber_count(&game_one), 0);
    assert_eq!(registry.subscriber_count(&game_two), 0);
}
