//! Webhook module: HTTP surface for the messaging platform

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use super::dispatcher::{Dispatcher, InboundMessage};

/// Form fields posted by Twilio for an inbound message
#[derive(Debug, Default, Deserialize)]
pub struct TwilioWebhookForm {
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "NumMedia")]
    pub num_media: Option<String>,
    #[serde(rename = "MediaUrl0")]
    pub media_url: Option<String>,
    #[serde(rename = "MediaContentType0")]
    pub media_content_type: Option<String>,
}

impl TwilioWebhookForm {
    /// Convert to an inbound message, `None` when the sender is missing
    pub fn into_message(self) -> Option<InboundMessage> {
        let sender = self.from.filter(|from| !from.trim().is_empty())?;
        let num_media = self
            .num_media
            .as_deref()
            .and_then(|n| n.trim().parse::<u32>().ok())
            .unwrap_or(0);
        Some(InboundMessage {
            sender,
            body: self.body,
            num_media,
            media_url: self.media_url,
            media_content_type: self.media_content_type,
        })
    }
}

/// Build the service router
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(handle_health))
        .with_state(dispatcher)
}

async fn handle_webhook(
    State(dispatcher): State<Arc<Dispatcher>>,
    Form(form): Form<TwilioWebhookForm>,
) -> Response {
    let Some(message) = form.into_message() else {
        warn!("Webhook call without a sender");
        return (StatusCode::BAD_REQUEST, "Missing From field").into_response();
    };

    let reply = dispatcher.handle(&message).await.render();
    (
        [(header::CONTENT_TYPE, "text/xml")],
        messaging_response(&reply),
    )
        .into_response()
}

async fn handle_health(State(dispatcher): State<Arc<Dispatcher>>) -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "conversations": dispatcher.store().len(),
    }))
    .into_response()
}

/// Wrap a reply in the TwiML messaging envelope
pub fn messaging_response(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape_xml(body)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
