use serde::{Deserialize, Serialize};

use crate::services::lobby::PlayerInfo;

pub const PROTOCOL_VERSION: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topic {
    #[serde(rename_all = "snake_case")]
    Game { id: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Hello { protocol: i32 },
    Subscribe { topic: Topic },
    Unsubscribe { topic: Topic },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    HelloAck {
        protocol: i32,
    },

    Ack {
        message: &'static str,
    },

    /// Pushed whenever the roster of a subscribed session changes, and once
    /// immediately after a successful subscribe.
    Roster {
        topic: Topic,
        players: Vec<PlayerInfo>,
        unavailable: bool,
    },

    Error {
        code: ErrorCode,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadProtocol,
    BadTopic,
    BadRequest,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadProtocol => "bad_protocol",
            ErrorCode::BadTopic => "bad_topic",
            ErrorCode::BadRequest => "bad_request",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_msg_round_trip() {
        let raw = r#"{"type":"subscribe","topic":{"kind":"game","id":42}}"#;
        let msg: ClientMsg = serde_json::from_str(raw).unwrap();
        match msg {
            ClientMsg::Subscribe { topic } => assert_eq!(topic, Topic::Game { id: 42 }),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn server_msg_roster_shape() {
        let msg = ServerMsg::Roster {
            topic: Topic::Game { id: 7 },
            players: Vec::new(),
            unavailable: false,
        };
        let encoded = serde_json::to_value(&msg).unwrap();
        assert_eq!(encoded["type"], "roster");
        assert_eq!(encoded["topic"]["kind"], "game");
        assert_eq!(encoded["topic"]["id"], 7);
        assert_eq!(encoded["unavailable"], false);
    }

    #[test]
    fn hello_version_mismatch_detectable() {
        let raw = r#"{"type":"hello","protocol":99}"#;
        let msg: ClientMsg = serde_json::from_str(raw).unwrap();
        match msg {
            ClientMsg::Hello { protocol } => assert_ne!(protocol, PROTOCOL_VERSION),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
