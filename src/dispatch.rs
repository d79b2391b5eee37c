//! Message dispatch
//!
//! Turns one inbound message into at most one reply from the menu and
//! executes it through a [`Messenger`]. Nothing is kept between messages.
//!
//! Remote failures never escape: every call's outcome is folded into a
//! [`DispatchReport`] that the caller inspects or drops.

use crate::channels::{InboundMessage, Messenger};
use crate::menu::{DocumentTransfer, Menu, Reply};
use crate::Error;

/// Outcome of one outbound text send
#[derive(Debug)]
pub enum Delivery {
    /// The platform accepted the message
    Sent,
    /// The send failed; the user gets no reply
    Failed(Error),
}

impl Delivery {
    /// Whether the platform accepted the message
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Outcome of the upload-then-send document flow
#[derive(Debug)]
pub enum TransferOutcome {
    /// Uploaded and sent
    Sent { media_id: String },
    /// Upload failed; no document send was attempted
    UploadFailed(Error),
    /// Upload succeeded but the document send failed
    SendFailed { media_id: String, error: Error },
}

/// What dispatching one message did
#[derive(Debug)]
pub enum DispatchReport {
    /// No text body; nothing was sent
    Ignored,
    /// A reply was sent (or attempted)
    Replied {
        /// Result of the text send
        text: Delivery,
        /// Result of the document flow, for replies that carry one
        transfer: Option<TransferOutcome>,
    },
}

impl DispatchReport {
    /// Number of outbound text sends attempted
    #[must_use]
    pub const fn texts_attempted(&self) -> usize {
        match self {
            Self::Ignored => 0,
            Self::Replied { .. } => 1,
        }
    }
}

/// Selects and sends menu replies
#[derive(Debug)]
pub struct Dispatcher {
    menu: Menu,
}

impl Dispatcher {
    /// Create a dispatcher over a validated menu
    #[must_use]
    pub const fn new(menu: Menu) -> Self {
        Self { menu }
    }

    /// The menu replies are selected from
    #[must_use]
    pub const fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Reply for a message, or `None` when it has no text body
    #[must_use]
    pub fn plan(&self, message: &InboundMessage) -> Option<&Reply> {
        message.body.as_deref().map(|body| self.menu.select(body))
    }

    /// Select and send the reply for one message
    ///
    /// Sends exactly one text for any message with a body. A reply carrying
    /// a document then runs the document flow, even if the text failed.
    pub async fn dispatch(
        &self,
        messenger: &dyn Messenger,
        message: &InboundMessage,
    ) -> DispatchReport {
        let Some(reply) = self.plan(message) else {
            tracing::debug!(from = %message.from, "message without text body, ignoring");
            return DispatchReport::Ignored;
        };

        tracing::info!(
            from = %message.from,
            body = message.body.as_deref().unwrap_or_default(),
            channel = messenger.name(),
            "incoming message"
        );

        let text = match messenger.send_text(&message.from, reply.text()).await {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                tracing::warn!(to = %message.from, error = %e, "failed to send reply");
                Delivery::Failed(e)
            }
        };

        let transfer = match reply.document() {
            Some(document) => Some(transfer_document(messenger, &message.from, document).await),
            None => None,
        };

        DispatchReport::Replied { text, transfer }
    }
}

/// Upload `document` and send it to `to` as a document message
///
/// The send only happens after a successful upload. Failures are logged and
/// returned, never retried.
pub async fn transfer_document(
    messenger: &dyn Messenger,
    to: &str,
    document: &DocumentTransfer,
) -> TransferOutcome {
    let media_id = match messenger
        .upload_media(&document.path, &document.mime_type)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(
                path = %document.path.display(),
                error = %e,
                "error uploading media, document not sent"
            );
            return TransferOutcome::UploadFailed(e);
        }
    };

    match messenger
        .send_document(to, &media_id, &document.filename)
        .await
    {
        Ok(()) => {
            tracing::info!(
                to,
                media_id = %media_id,
                filename = %document.filename,
                "document sent"
            );
            TransferOutcome::Sent { media_id }
        }
        Err(e) => {
            tracing::error!(to, media_id = %media_id, error = %e, "failed to send document");
            TransferOutcome::SendFailed { media_id, error: e }
        }
    }
}
