//! `WhatsApp` channel tests against a local stub of the Graph API

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
};
use menubot_gateway::channels::{InboundMessage, Messenger, WhatsAppChannel};
use menubot_gateway::config::WhatsAppConfig;
use menubot_gateway::dispatch::{DispatchReport, TransferOutcome};
use menubot_gateway::{Dispatcher, DocumentTransfer, Error, menu};
use secrecy::SecretString;
use tokio::sync::Mutex;

const PHONE_ID: &str = "109876543210";
const TOKEN: &str = "stub-access-token";

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl Recorded {
    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Default)]
struct Stub {
    requests: Mutex<Vec<Recorded>>,
    fail_media: bool,
    fail_messages: bool,
    media_without_id: bool,
}

async fn capture(
    State(stub): State<Arc<Stub>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };
    let path = uri.path().to_string();
    stub.requests.lock().await.push(Recorded {
        method,
        path: path.clone(),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        body: body.to_vec(),
    });

    let is_media = path.ends_with("/media");
    if (is_media && stub.fail_media) || (!is_media && stub.fail_messages) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": { "message": "Invalid parameter", "code": 100 } })),
        );
    }

    if is_media && stub.media_without_id {
        (StatusCode::OK, Json(serde_json::json!({ "success": true })))
    } else if is_media {
        (StatusCode::OK, Json(serde_json::json!({ "id": "media-987" })))
    } else {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "messaging_product": "whatsapp",
                "messages": [{ "id": "wamid.OUT" }]
            })),
        )
    }
}

/// Start the stub server and return a channel pointed at it
async fn start_stub(stub: Stub) -> (Arc<Stub>, WhatsAppChannel) {
    let stub = Arc::new(stub);
    let app = Router::new().fallback(capture).with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let channel = WhatsAppChannel::new(WhatsAppConfig {
        access_token: SecretString::from(TOKEN.to_string()),
        phone_number_id: PHONE_ID.to_string(),
        api_url: format!("http://{addr}/v19.0/"),
        request_timeout: Duration::from_secs(5),
    })
    .unwrap();

    (stub, channel)
}

fn write_pdf(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"%PDF-1.4\n% menubot test document\n%%EOF\n").unwrap();
    path
}

#[tokio::test]
async fn test_send_text_posts_json_with_bearer_token() {
    let (stub, channel) = start_stub(Stub::default()).await;

    channel.send_text("15551234567", "hello there").await.unwrap();

    let requests = stub.requests.lock().await;
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path, format!("/v19.0/{PHONE_ID}/messages"));
    assert_eq!(req.authorization.as_deref(), Some("Bearer stub-access-token"));
    assert_eq!(req.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        req.json(),
        serde_json::json!({
            "messaging_product": "whatsapp",
            "to": "15551234567",
            "type": "text",
            "text": { "body": "hello there" }
        })
    );
}

#[tokio::test]
async fn test_upload_media_sends_multipart_and_returns_id() {
    let (stub, channel) = start_stub(Stub::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(&dir, "brochure.pdf");

    let media_id = channel.upload_media(&path, "application/pdf").await.unwrap();

    assert_eq!(media_id, "media-987");
    let requests = stub.requests.lock().await;
    let req = &requests[0];
    assert_eq!(req.path, format!("/v19.0/{PHONE_ID}/media"));
    assert_eq!(req.authorization.as_deref(), Some("Bearer stub-access-token"));
    assert!(
        req.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("multipart/form-data; boundary="))
    );

    let body = req.text();
    assert!(body.contains("name=\"messaging_product\""));
    assert!(body.contains("name=\"type\""));
    assert!(body.contains("application/pdf"));
    assert!(body.contains("name=\"file\"; filename=\"brochure.pdf\""));
    assert!(body.contains("% menubot test document"));
}

#[tokio::test]
async fn test_send_document_references_media_id() {
    let (stub, channel) = start_stub(Stub::default()).await;

    channel
        .send_document("15551234567", "media-987", "Services.pdf")
        .await
        .unwrap();

    let requests = stub.requests.lock().await;
    let json = requests[0].json();
    assert_eq!(json["type"], "document");
    assert_eq!(json["to"], "15551234567");
    assert_eq!(json["document"]["id"], "media-987");
    assert_eq!(json["document"]["filename"], "Services.pdf");
}

#[tokio::test]
async fn test_api_error_status_is_channel_error() {
    let (_stub, channel) = start_stub(Stub {
        fail_messages: true,
        ..Default::default()
    })
    .await;

    let err = channel.send_text("15551234567", "hi").await.unwrap_err();

    match err {
        Error::Channel(msg) => {
            assert!(msg.contains("400"), "{msg}");
            assert!(msg.contains("Invalid parameter"), "{msg}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_upload_response_without_id_is_serialization_error() {
    let (_stub, channel) = start_stub(Stub {
        media_without_id: true,
        ..Default::default()
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(&dir, "brochure.pdf");

    let err = channel.upload_media(&path, "application/pdf").await.unwrap_err();

    assert!(matches!(err, Error::Serialization(_)), "{err}");
}

#[tokio::test]
async fn test_upload_of_missing_file_makes_no_request() {
    let (stub, channel) = start_stub(Stub::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let err = channel
        .upload_media(&dir.path().join("absent.pdf"), "application/pdf")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert!(stub.requests.lock().await.is_empty());
}

#[tokio::test]
async fn test_code_four_end_to_end_against_stub() {
    let (stub, channel) = start_stub(Stub::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(&dir, "comics.pdf");
    let dispatcher = Dispatcher::new(menu::kings_hospital(DocumentTransfer::new(path)).unwrap());

    let report = dispatcher
        .dispatch(
            &channel,
            &InboundMessage {
                from: "15551234567".to_string(),
                body: Some("4".to_string()),
            },
        )
        .await;

    assert!(matches!(
        report,
        DispatchReport::Replied {
            transfer: Some(TransferOutcome::Sent { .. }),
            ..
        }
    ));

    let requests = stub.requests.lock().await;
    let paths: Vec<_> = requests.iter().map(|r| r.path.rsplit('/').next().unwrap()).collect();
    assert_eq!(paths, ["messages", "media", "messages"]);
    assert_eq!(requests[0].json()["type"], "text");
    let document = requests[2].json();
    assert_eq!(document["document"]["id"], "media-987");
    assert_eq!(document["document"]["filename"], "comics.pdf");
}

#[tokio::test]
async fn test_upload_failure_against_stub_skips_document() {
    let (stub, channel) = start_stub(Stub {
        fail_media: true,
        ..Default::default()
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(&dir, "comics.pdf");
    let dispatcher = Dispatcher::new(menu::kings_hospital(DocumentTransfer::new(path)).unwrap());

    let report = dispatcher
        .dispatch(
            &channel,
            &InboundMessage {
                from: "15551234567".to_string(),
                body: Some("4".to_string()),
            },
        )
        .await;

    assert!(matches!(
        report,
        DispatchReport::Replied {
            transfer: Some(TransferOutcome::UploadFailed(Error::Channel(_))),
            ..
        }
    ));
    assert_eq!(stub.requests.lock().await.len(), 2);
}
