use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Html,
    routing::{get, post},
};
use futures::future;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, error, info_span, warn};
use tracing_futures::Instrument;

use crate::{
    Error,
    command::Interpreter,
    line::{Messenger, SIGNATURE_HEADER, SignatureVerifier, TextMessage, WebhookBody},
};

#[derive(Clone)]
pub struct AppState {
    pub interpreter: Arc<Interpreter>,
    pub messenger: Arc<dyn Messenger>,
    pub verifier: Arc<SignatureVerifier>,
}

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/callback", post(callback))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Html<&'static str> {
    Html("<h1>healthy</h1>")
}

async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, StatusCode> {
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        warn!("webhook request without signature");
        return Err(StatusCode::BAD_REQUEST);
    };

    if !state.verifier.verify(&body, signature) {
        error!("invalid webhook signature, check LINE_CHANNEL_SECRET");
        return Err(StatusCode::BAD_REQUEST);
    }

    let payload: WebhookBody = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "unparseable webhook body");
        StatusCode::BAD_REQUEST
    })?;

    debug!(events = payload.events.len(), "webhook received");

    // Users are served concurrently; one user's messages stay in order.
    let mut per_user: Vec<(&str, Vec<TextMessage<'_>>)> = Vec::new();
    for event in &payload.events {
        let Some(message) = event.as_text_message() else {
            debug!(kind = %event.kind, "ignoring non-text event");
            continue;
        };

        match per_user.iter_mut().find(|(user_id, _)| *user_id == message.user_id) {
            Some((_, messages)) => messages.push(message),
            None => per_user.push((message.user_id, vec![message])),
        }
    }

    let failed: usize = future::join_all(
        per_user
            .into_iter()
            .map(|(_, messages)| handle_user(&state, messages)),
    )
    .await
    .into_iter()
    .sum();

    if failed > 0 {
        error!(failed, "webhook events failed");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    Ok("OK")
}

/// Handles one user's messages in order, returning how many failed.
async fn handle_user(state: &AppState, messages: Vec<TextMessage<'_>>) -> usize {
    let mut failed = 0;

    for message in messages {
        let span = info_span!("line_event", user_id = %message.user_id);
        if let Err(e) = handle_text(state, message).instrument(span).await {
            error!(error = ?e, user_id = %message.user_id, "failed to handle message");
            failed += 1;
        }
    }

    failed
}

async fn handle_text(state: &AppState, message: TextMessage<'_>) -> Result<(), Error> {
    let Some(reply) = state
        .interpreter
        .handle(message.user_id, message.text)
        .await?
    else {
        debug!("unrecognized message, not replying");
        return Ok(());
    };

    state
        .messenger
        .reply(message.reply_token, &reply)
        .await
        .context("sending reply")
}
