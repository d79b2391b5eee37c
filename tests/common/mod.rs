//! Shared test utilities

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use menubot_gateway::api::{self, ApiState};
use menubot_gateway::channels::Messenger;
use menubot_gateway::{Dispatcher, DocumentTransfer, Error, menu};
use secrecy::SecretString;
use tokio::sync::Mutex;

/// Verify token the test router expects
pub const VERIFY_TOKEN: &str = "test-verify-token";

/// Media ID the mock hands out for uploads
pub const MEDIA_ID: &str = "media-1234";

/// A recorded outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { to: String, body: String },
    Upload { path: PathBuf, mime_type: String },
    Document { to: String, media_id: String, filename: String },
}

/// Mock messenger that records calls and fails on demand
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<Sent>>,
    pub fail_text: bool,
    pub fail_upload: bool,
    pub fail_document: bool,
}

impl RecordingMessenger {
    pub async fn sent(&self) -> Vec<Sent> {
        self.sent.lock().await.clone()
    }

    pub async fn texts(&self) -> Vec<String> {
        self.sent()
            .await
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    pub async fn documents_sent(&self) -> usize {
        self.sent()
            .await
            .iter()
            .filter(|s| matches!(s, Sent::Document { .. }))
            .count()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send_text(&self, to: &str, body: &str) -> menubot_gateway::Result<()> {
        self.sent.lock().await.push(Sent::Text {
            to: to.to_string(),
            body: body.to_string(),
        });
        if self.fail_text {
            return Err(Error::Channel("simulated text failure".to_string()));
        }
        Ok(())
    }

    async fn upload_media(&self, path: &Path, mime_type: &str) -> menubot_gateway::Result<String> {
        self.sent.lock().await.push(Sent::Upload {
            path: path.to_path_buf(),
            mime_type: mime_type.to_string(),
        });
        if self.fail_upload {
            return Err(Error::Channel("simulated upload failure".to_string()));
        }
        Ok(MEDIA_ID.to_string())
    }

    async fn send_document(
        &self,
        to: &str,
        media_id: &str,
        filename: &str,
    ) -> menubot_gateway::Result<()> {
        self.sent.lock().await.push(Sent::Document {
            to: to.to_string(),
            media_id: media_id.to_string(),
            filename: filename.to_string(),
        });
        if self.fail_document {
            return Err(Error::Channel("simulated document failure".to_string()));
        }
        Ok(())
    }
}

/// Document the built-in test menu sends for code `4`
pub fn test_document() -> DocumentTransfer {
    DocumentTransfer::new("comics.pdf")
}

/// Router over the built-in menu and the given messenger
pub fn build_test_router(messenger: Arc<RecordingMessenger>) -> axum::Router {
    let menu = menu::kings_hospital(test_document()).expect("built-in menu is valid");
    let state = Arc::new(ApiState {
        verify_token: SecretString::from(VERIFY_TOKEN.to_string()),
        messenger,
        dispatcher: Dispatcher::new(menu),
    });
    api::router(state)
}

/// Webhook delivery payload carrying one message
pub fn delivery(from: Option<&str>, body: Option<&str>) -> serde_json::Value {
    let mut message = serde_json::json!({
        "id": "wamid.TEST",
        "timestamp": "1700000000",
        "type": "text"
    });
    if let Some(from) = from {
        message["from"] = serde_json::json!(from);
    }
    if let Some(body) = body {
        message["text"] = serde_json::json!({ "body": body });
    }

    serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WHATSAPP_BUSINESS_ACCOUNT_ID",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": { "phone_number_id": "PHONE_NUMBER_ID" },
                    "messages": [message]
                }
            }]
        }]
    })
}
