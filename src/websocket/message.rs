use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::ConnectionId;

/// Which peer a relayed `candidate` is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateTarget {
    Broadcaster,
    Viewer,
}

/// Messages sent from client to server.
///
/// `sdp` and `candidate` payloads are opaque and relayed unchanged.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    RegisterBroadcaster,
    RegisterViewer,
    Offer {
        #[serde(default)]
        target_id: Option<ConnectionId>,
        sdp: Value,
    },
    Answer {
        sdp: Value,
    },
    Candidate {
        #[serde(default)]
        target: Option<CandidateTarget>,
        #[serde(default)]
        target_id: Option<ConnectionId>,
        candidate: Value,
    },
    /// Any other `type`; ignored
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::RegisterBroadcaster => "register_broadcaster",
            Self::RegisterViewer => "register_viewer",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
            Self::Unknown => "unknown",
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    NewViewer {
        viewer_id: ConnectionId,
    },
    Offer {
        sdp: Value,
        broadcaster_id: Option<ConnectionId>,
    },
    Answer {
        sdp: Value,
        viewer_id: ConnectionId,
    },
    Candidate {
        candidate: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        viewer_id: Option<ConnectionId>,
    },
    Error {
        message: String,
    },
    BroadcasterDisconnected,
    ViewerDisconnected {
        viewer_id: ConnectionId,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            Self::NewViewer { .. } => "new_viewer",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
            Self::Error { .. } => "error",
            Self::BroadcasterDisconnected => "broadcaster_disconnected",
            Self::ViewerDisconnected { .. } => "viewer_disconnected",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_parse_registration() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"register_viewer"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::RegisterViewer));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"register_broadcaster"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::RegisterBroadcaster));
    }

    #[test]
    fn test_parse_offer_keeps_sdp_opaque() {
        let id = Uuid::new_v4();
        let raw = json!({
            "type": "offer",
            "target_id": id.to_string(),
            "sdp": {"type": "offer", "sdp": "v=0\r\n", "extra": [1, 2, 3]}
        });

        let msg: ClientMessage = serde_json::from_value(raw.clone()).unwrap();
        match msg {
            ClientMessage::Offer { target_id, sdp } => {
                assert_eq!(target_id, Some(ConnectionId::from(id)));
                assert_eq!(sdp, raw["sdp"]);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_candidate_without_target_id() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "candidate",
            "target": "broadcaster",
            "candidate": {"candidate": "candidate:1 1 udp 2122260223 10.0.0.1 5000 typ host"}
        }))
        .unwrap();

        match msg {
            ClientMessage::Candidate {
                target, target_id, ..
            } => {
                assert_eq!(target, Some(CandidateTarget::Broadcaster));
                assert!(target_id.is_none());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping","x":1}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Unknown));
    }

    #[test]
    fn test_missing_sdp_is_malformed() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"type":"answer"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_message_shapes() {
        let id = ConnectionId::from(Uuid::nil());

        let value = serde_json::to_value(ServerMessage::NewViewer { viewer_id: id }).unwrap();
        assert_eq!(
            value,
            json!({"type": "new_viewer", "viewer_id": "00000000-0000-0000-0000-000000000000"})
        );

        let value = serde_json::to_value(ServerMessage::BroadcasterDisconnected).unwrap();
        assert_eq!(value, json!({"type": "broadcaster_disconnected"}));

        let value = serde_json::to_value(ServerMessage::error("Broadcaster is not online")).unwrap();
        assert_eq!(value, json!({"type": "error", "message": "Broadcaster is not online"}));
    }

    #[test]
    fn test_candidate_to_viewer_omits_viewer_id() {
        let msg = ServerMessage::Candidate {
            candidate: json!({"candidate": "c"}),
            viewer_id: None,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"type": "candidate", "candidate": {"candidate": "c"}}));
    }
}
