//! Messaging channel adapters
//!
//! The dispatcher only talks to the [`Messenger`] trait; the `WhatsApp` Cloud
//! API adapter is the production implementation.

mod whatsapp;

use std::path::Path;

use async_trait::async_trait;

pub use whatsapp::{
    WhatsAppChannel, document_message_body, first_message, inbound_message, text_message_body,
};

use crate::Result;

/// A message received from a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender identifier replies are addressed to
    pub from: String,

    /// Text body, absent for non-text messages
    pub body: Option<String>,
}

/// Outbound operations against a messaging platform
///
/// Each call is an independent network request; nothing is retried and no
/// call depends on another except through the values passed in.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Channel name for logging
    fn name(&self) -> &'static str;

    /// Send a text message
    async fn send_text(&self, to: &str, body: &str) -> Result<()>;

    /// Upload a local file and return the platform's media identifier
    async fn upload_media(&self, path: &Path, mime_type: &str) -> Result<String>;

    /// Send a previously uploaded media item as a document
    async fn send_document(&self, to: &str, media_id: &str, filename: &str) -> Result<()>;
}
