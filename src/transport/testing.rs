//! In-process WebChannel bridge for transport tests.

use futures_util::{SinkExt, StreamExt};
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::protocol::WEB_CHANNEL_ID;

/// How the fake host answers one request type.
pub(crate) enum HostReply {
    Success(Value),
    Error(String),
    ChannelError(String),
    /// Answers with a one-symbol table named `{debugName}/{breakpadId}`.
    EchoSymbolTable,
    Ignore,
}

/// Connects to a bridge server, sends READY, then answers requests.
pub(crate) struct FakeBridge {
    user_agent: String,
    replies: FxHashMap<&'static str, HostReply>,
}

impl FakeBridge {
    pub(crate) fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            replies: FxHashMap::default(),
        }
    }

    pub(crate) fn on(mut self, kind: &'static str, reply: HostReply) -> Self {
        self.replies.insert(kind, reply);
        self
    }

    pub(crate) fn spawn(self, url: String) -> JoinHandle<()> {
        tokio::spawn(async move {
            let (mut ws, _) = connect_async(url).await.expect("bridge connects");

            let ready = json!({
                "id": WEB_CHANNEL_ID,
                "message": { "type": "READY", "userAgent": self.user_agent },
            });
            ws.send(Message::Text(ready.to_string().into()))
                .await
                .expect("send READY");

            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let value: Value = serde_json::from_str(&text).expect("request is JSON");
                let message = &value["message"];
                let request_id = message["requestId"].clone();
                let kind = message["type"].as_str().unwrap_or_default();

                let body = match self.replies.get(kind) {
                    Some(HostReply::Success(response)) => json!({
                        "type": "SUCCESS_RESPONSE",
                        "requestId": request_id,
                        "response": response,
                    }),
                    Some(HostReply::Error(error)) => json!({
                        "type": "ERROR_RESPONSE",
                        "requestId": request_id,
                        "error": error,
                    }),
                    Some(HostReply::ChannelError(error)) => json!({ "errno": 2, "error": error }),
                    Some(HostReply::EchoSymbolTable) => {
                        let name = format!(
                            "{}/{}",
                            message["debugName"].as_str().unwrap_or_default(),
                            message["breakpadId"].as_str().unwrap_or_default()
                        );
                        json!({
                            "type": "SUCCESS_RESPONSE",
                            "requestId": request_id,
                            "response": [[4096], [0, name.len()], name.into_bytes()],
                        })
                    }
                    Some(HostReply::Ignore) => continue,
                    None => json!({
                        "type": "ERROR_RESPONSE",
                        "requestId": request_id,
                        "error": format!("Unexpected message type: {kind}"),
                    }),
                };

                let reply = json!({ "id": WEB_CHANNEL_ID, "message": body });
                if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                    break;
                }
            }
        })
    }
}
