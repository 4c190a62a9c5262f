use actix::prelude::*;
use dashmap::DashMap;
use uuid::Uuid;

use crate::ws::protocol::Topic;
use crate::ws::session::HubEvent;

/// Per-process registry of websocket subscriptions, keyed by topic.
///
/// Each connection may subscribe to any number of topics; broadcast fans an
/// event out to every recipient currently subscribed to that topic. Entries
/// for a connection are dropped on unsubscribe or session stop.
#[derive(Default)]
pub struct WsRegistry {
    topics: DashMap<Topic, DashMap<Uuid, Recipient<HubEvent>>>,
}

impl WsRegistry {
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
        }
    }

    pub fn subscribe(&self, topic: Topic, conn_id: Uuid, recipient: Recipient<HubEvent>) {
        let entry = self.topics.entry(topic).or_default();
        entry.insert(conn_id, recipient);
    }

    pub fn unsubscribe(&self, topic: &Topic, conn_id: Uuid) {
        if let Some(entry) = self.topics.get(topic) {
            entry.remove(&conn_id);
            if entry.is_empty() {
                drop(entry);
                self.topics.remove_if(topic, |_, subs| subs.is_empty());
            }
        }
    }

    /// Drop every subscription held by a connection. Called when the session
    /// actor stops.
    pub fn unsubscribe_all(&self, conn_id: Uuid) {
        for entry in self.topics.iter() {
            entry.value().remove(&conn_id);
        }
        self.topics.retain(|_, subs| !subs.is_empty());
    }

    pub fn broadcast(&self, topic: &Topic, event: HubEvent) {
        if let Some(entry) = self.topics.get(topic) {
            for recipient in entry.iter() {
                let _ = recipient.value().do_send(event.clone());
            }
        }
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.topics.get(topic).map(|entry| entry.len()).unwrap_or(0)
    }
}
