//! HTTP router and handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::warn;

use super::service::{DEFAULT_SENDER_ID, DeliveryRequest, SmsGateway};
use crate::correlation;
use crate::delivery::DeliveryOutcome;
use crate::stats::RequestState;

/// Value the `action` query parameter must carry
pub const SEND_ACTION: &str = "sms";

/// Error text for a request missing `action=sms` or `message`
pub const INVALID_PARAMETERS_MESSAGE: &str = "Invalid or missing parameters";

/// Shared application state
pub struct AppState {
    /// Gateway core
    pub gateway: Arc<SmsGateway>,
}

/// Query parameters of `GET /send`
#[derive(Debug, Default, Deserialize)]
pub struct SendParams {
    /// Recipient phone number
    pub telnr: Option<String>,
    /// Subject line
    pub subject: Option<String>,
    /// Message body
    pub message: Option<String>,
    /// Must equal [`SEND_ACTION`]
    pub action: Option<String>,
    /// Caller identifier
    pub id: Option<String>,
}

/// Body of every `GET /send` response
#[derive(Debug, Serialize)]
struct SendResponse {
    #[serde(flatten)]
    outcome: DeliveryOutcome,
    request_id: String,
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/send", get(send_handler))
        .route("/health", get(health_handler))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /send handler
async fn send_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SendParams>,
) -> impl IntoResponse {
    let sender_id = params
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_SENDER_ID.to_string());

    let message = match (params.action.as_deref(), params.message) {
        (Some(SEND_ACTION), Some(message)) => message,
        (action, message) => {
            let request_id = correlation::generate();
            warn!(
                request_id = %request_id,
                sender_id = %sender_id,
                recipient = ?params.telnr,
                action = ?action,
                has_message = message.is_some(),
                "Invalid request"
            );
            let body = SendResponse {
                outcome: DeliveryOutcome::error(INVALID_PARAMETERS_MESSAGE),
                request_id,
            };
            return (StatusCode::BAD_REQUEST, Json(body));
        }
    };

    let mut request = DeliveryRequest::new(params.telnr.unwrap_or_default(), message)
        .with_sender_id(sender_id);
    if let Some(subject) = params.subject.filter(|s| !s.is_empty()) {
        request = request.with_subject(subject);
    }

    let handled = state.gateway.handle(request).await;
    let status = match handled.state {
        RequestState::Delivered => StatusCode::OK,
        RequestState::Rejected => StatusCode::BAD_REQUEST,
        RequestState::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        RequestState::DeliveryFailed => StatusCode::BAD_GATEWAY,
    };

    (
        status,
        Json(SendResponse {
            outcome: handled.outcome,
            request_id: handled.correlation_id,
        }),
    )
}

/// GET /health handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let limiter = state.gateway.limiter();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "rate_window": {
            "in_window": limiter.in_window(),
            "limit": limiter.limit(),
            "window_secs": limiter.window().as_secs(),
        },
        "stats": state.gateway.stats(),
    }))
}

/// GET / handler - static usage page
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>SMS Gateway</title></head>
<body>
<h1>SMS Gateway</h1>
<p>Send a message with a GET request:</p>
<pre>/send?telnr=46701234567&amp;subject=Test&amp;message=Hello&amp;action=sms&amp;id=my-system</pre>
<ul>
<li><code>telnr</code>: recipient in international format, the leading <code>+</code> is optional</li>
<li><code>message</code>: message text</li>
<li><code>action</code>: must be <code>sms</code></li>
<li><code>subject</code>: optional subject</li>
<li><code>id</code>: optional caller identifier</li>
</ul>
<p>Responses are JSON with <code>status</code>, <code>request_id</code>, and either <code>response</code> or <code>error</code>.
HTTP 400 means invalid input, 429 means the shared send budget is exhausted, 502 means the provider call failed.</p>
</body>
</html>
"#;
