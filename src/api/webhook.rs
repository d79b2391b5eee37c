//! `WhatsApp` webhook endpoints
//!
//! `GET /` answers the one-time verification handshake, `POST /` receives
//! message deliveries.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::api::ApiState;
use crate::channels::inbound_message;

/// Verification handshake query parameters
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Challenge to echo if the handshake is valid for `expected_token`
#[must_use]
pub fn verify_subscription(query: &VerifyQuery, expected_token: &str) -> Option<String> {
    let subscribed = query.mode.as_deref() == Some("subscribe");
    let token_ok = query.verify_token.as_deref() == Some(expected_token);
    (subscribed && token_ok).then(|| query.challenge.clone().unwrap_or_default())
}

/// Handle the webhook verification handshake
///
/// Echoes `hub.challenge` verbatim on success, 403 with an empty body
/// otherwise.
#[allow(clippy::unused_async)]
pub async fn verify(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<VerifyQuery>,
) -> (StatusCode, String) {
    match verify_subscription(&query, state.verify_token.expose_secret()) {
        Some(challenge) => {
            tracing::info!("webhook verified");
            (StatusCode::OK, challenge)
        }
        None => {
            tracing::debug!(mode = ?query.mode, "webhook verification rejected");
            (StatusCode::FORBIDDEN, String::new())
        }
    }
}

/// Handle an incoming webhook delivery
///
/// Always acknowledges with 200, including bodies that are not JSON or do
/// not carry a message; the platform redelivers on anything else.
pub async fn receive(State(state): State<Arc<ApiState>>, body: Bytes) -> StatusCode {
    let payload = match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "webhook delivery is not JSON, acknowledging");
            return StatusCode::OK;
        }
    };

    let Some(message) = inbound_message(&payload) else {
        tracing::debug!("webhook delivery without message, acknowledging");
        return StatusCode::OK;
    };

    // Remote failures are already logged by the dispatcher and must not
    // change the acknowledgement.
    let report = state
        .dispatcher
        .dispatch(state.messenger.as_ref(), &message)
        .await;
    tracing::debug!(?report, "dispatch finished");

    StatusCode::OK
}
