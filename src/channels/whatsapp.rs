//! `WhatsApp` channel adapter
//!
//! Uses the `WhatsApp` Business Cloud API for sending text, uploading media
//! and sending documents. Inbound messages arrive through the webhook
//! endpoints in [`crate::api::webhook`].

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{InboundMessage, Messenger};
use crate::config::WhatsAppConfig;
use crate::{Error, Result};

/// `WhatsApp` channel adapter
pub struct WhatsAppChannel {
    /// `WhatsApp` Business API access token
    access_token: SecretString,
    /// Phone number ID for sending messages
    phone_number_id: String,
    /// Graph API base URL, e.g. `https://graph.facebook.com/v19.0`
    api_url: String,
    client: Client,
}

impl WhatsAppChannel {
    /// Create a `WhatsApp` channel adapter from configuration
    ///
    /// The HTTP client is built once with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the token or phone number ID is empty, or the HTTP
    /// client cannot be built
    pub fn new(config: WhatsAppConfig) -> Result<Self> {
        if config.access_token.expose_secret().is_empty() {
            return Err(Error::Config("WhatsApp access token required".to_string()));
        }
        if config.phone_number_id.is_empty() {
            return Err(Error::Config("WhatsApp phone number ID required".to_string()));
        }

        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            access_token: config.access_token,
            phone_number_id: config.phone_number_id,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.api_url, self.phone_number_id)
    }

    fn media_url(&self) -> String {
        format!("{}/{}/media", self.api_url, self.phone_number_id)
    }

    /// POST a JSON message body to the messages endpoint
    async fn post_message(&self, body: &serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(self.messages_url())
            .bearer_auth(self.access_token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Channel(format!("WhatsApp API error: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Channel(format!(
                "WhatsApp API error: {status} - {body}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Messenger for WhatsAppChannel {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        self.post_message(&text_message_body(to, body)).await?;
        tracing::debug!(to, "WhatsApp text sent");
        Ok(())
    }

    async fn upload_media(&self, path: &Path, mime_type: &str) -> Result<String> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let filename = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());

        // Streamed from disk rather than buffered
        let part = Part::stream_with_length(Body::from(file), len)
            .file_name(filename)
            .mime_str(mime_type)
            .map_err(|e| Error::Channel(format!("Invalid MIME type {mime_type}: {e}")))?;

        let form = Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", mime_type.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.media_url())
            .bearer_auth(self.access_token.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Channel(format!("WhatsApp media upload failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Channel(format!(
                "WhatsApp media upload error: {status} - {body}"
            )));
        }

        let body = response.text().await?;
        let uploaded: MediaUploadResponse = serde_json::from_str(&body)?;

        tracing::debug!(path = %path.display(), media_id = %uploaded.id, "WhatsApp media uploaded");
        Ok(uploaded.id)
    }

    async fn send_document(&self, to: &str, media_id: &str, filename: &str) -> Result<()> {
        self.post_message(&document_message_body(to, media_id, filename))
            .await?;
        tracing::debug!(to, media_id, "WhatsApp document sent");
        Ok(())
    }
}

/// JSON body for a text message
#[must_use]
pub fn text_message_body(to: &str, body: &str) -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "text",
        "text": { "body": body }
    })
}

/// JSON body for a document message referencing uploaded media
#[must_use]
pub fn document_message_body(to: &str, media_id: &str, filename: &str) -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "document",
        "document": {
            "id": media_id,
            "filename": filename
        }
    })
}

#[derive(Deserialize)]
struct MediaUploadResponse {
    id: String,
}

/// First message of the first change of the first entry of a webhook payload
///
/// The payload is walked without a fixed schema: status callbacks, `null`
/// levels and unexpected shapes all yield `None`. The Cloud API delivers one
/// message per webhook call; anything after the first is ignored.
#[must_use]
pub fn first_message(payload: &serde_json::Value) -> Option<&serde_json::Value> {
    payload
        .get("entry")?
        .get(0)?
        .get("changes")?
        .get(0)?
        .get("value")?
        .get("messages")?
        .get(0)
}

/// Extract the inbound message to dispatch, if the payload carries one
/// with a sender
///
/// A text body that is not a string is treated as absent.
#[must_use]
pub fn inbound_message(payload: &serde_json::Value) -> Option<InboundMessage> {
    let msg = first_message(payload)?;
    let from = msg["from"].as_str().filter(|f| !f.is_empty())?;
    tracing::debug!(
        from,
        message_id = msg["id"].as_str().unwrap_or_default(),
        message_type = msg["type"].as_str().unwrap_or_default(),
        "WhatsApp message received"
    );
    Some(InboundMessage {
        from: from.to_string(),
        body: msg["text"]["body"].as_str().map(ToString::to_string),
    })
}
