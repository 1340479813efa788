//! In-process stand-in for the CRM used by tests.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the stub answers a call.
#[derive(Debug, Clone)]
pub enum StubReply {
    /// 201 for creates, 200 for updates. Creates return `contact_id`, or a
    /// generated `contact-<n>` when it is `None`.
    Accept { contact_id: Option<String> },
    Reject { status: u16, body: String },
    /// Sleeps before answering, to trip client timeouts.
    Stall(Duration),
}

impl StubReply {
    pub fn accept(contact_id: &str) -> Self {
        StubReply::Accept {
            contact_id: Some(contact_id.to_string()),
        }
    }

    pub fn accept_any() -> Self {
        StubReply::Accept { contact_id: None }
    }

    pub fn reject(status: u16, body: &str) -> Self {
        StubReply::Reject {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub version: Option<String>,
    pub body: serde_json::Value,
}

struct StubState {
    default_reply: Mutex<StubReply>,
    queued: Mutex<VecDeque<StubReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Mutex<Option<Duration>>,
}

pub struct StubCrm {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubCrm {
    pub async fn start(default_reply: StubReply) -> Self {
        let state = Arc::new(StubState {
            default_reply: Mutex::new(default_reply),
            queued: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
        });

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Answers the next call with `reply`, ahead of the default.
    pub fn push_reply(&self, reply: StubReply) {
        self.state.queued.lock().unwrap().push_back(reply);
    }

    pub fn set_default(&self, reply: StubReply) {
        *self.state.default_reply.lock().unwrap() = reply;
    }

    /// Delays every answer, without exceeding client timeouts.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }
}

async fn handle(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let request_number = {
        let mut requests = state.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: method.to_string(),
            path: uri.path().to_string(),
            authorization: header("authorization"),
            version: header("version"),
            body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
        });
        requests.len()
    };

    let reply = state
        .queued
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| state.default_reply.lock().unwrap().clone());

    let delay = *state.delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    match reply {
        StubReply::Accept { contact_id } => {
            if method == Method::PUT {
                let id = uri.path().trim_start_matches("/contacts/").to_string();
                (
                    StatusCode::OK,
                    Json(serde_json::json!({ "succeeded": true, "contact": { "id": id } })),
                )
                    .into_response()
            } else {
                let id = contact_id.unwrap_or_else(|| format!("contact-{}", request_number));
                (
                    StatusCode::CREATED,
                    Json(serde_json::json!({ "contact": { "id": id } })),
                )
                    .into_response()
            }
        }
        StubReply::Reject { status, body } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response(),
        StubReply::Stall(duration) => {
            tokio::time::sleep(duration).await;
            StatusCode::OK.into_response()
        }
    }
}
