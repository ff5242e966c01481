use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{ConnectInfo, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};

use crate::{
    config::Config,
    intake::{
        error::{IntakeError, IntakeErrorKind, invalid_body, method_not_allowed},
        gateway::IntakeGateway,
        types::SubmissionPayload,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<IntakeGateway>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HostIdBody {
    host_id: String,
}

pub async fn run(config: Config) -> Result<()> {
    let state = AppState {
        gateway: Arc::new(IntakeGateway::new(&config.intake)),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("unable to bind {}", config.server.bind))?;
    let local_addr = listener
        .local_addr()
        .context("unable to read bound address")?;
    info!(target: "server", addr = %local_addr, "listening");

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
    let shutdown = async move {
        let received = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        info!(target: "server", signal = received, "shutdown signal received");
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("server terminated abnormally")?;

    Ok(())
}

/// Non-POST hits on the contact route answer 405 through the method-routing
/// fallback; axum fills in the `Allow` header from the registered methods.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/contact",
            post(submit_contact).fallback(contact_method_not_allowed),
        )
        .route("/api/host-id", get(host_identity))
        .with_state(state)
}

async fn submit_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    body: Result<Json<SubmissionPayload>, JsonRejection>,
) -> Response {
    let identity = client_identity(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    let payload = match body {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            warn!(
                target: "server",
                identity = %identity,
                reason = %rejection.body_text(),
                "rejecting unreadable submission body"
            );
            return error_response(&invalid_body());
        }
    };

    match state.gateway.submit(payload, &identity).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn contact_method_not_allowed() -> Response {
    error_response(&method_not_allowed())
}

async fn host_identity() -> Response {
    (
        [(header::CACHE_CONTROL, "no-store, max-age=0")],
        Json(HostIdBody {
            host_id: host_id_from_env(),
        }),
    )
        .into_response()
}

/// Rate-limit key for the requester. Behind a proxy the first forwarded hop
/// wins; otherwise the peer address; `unknown` pools whatever is left.
fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        && let Some(first) = forwarded.split(',').next()
    {
        let first = first.trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn host_id_from_env() -> String {
    std::env::var("CONCIERGE_HOST_ID")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| {
            std::env::var("HOSTNAME")
                .ok()
                .filter(|value| !value.trim().is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn error_response(error: &IntakeError) -> Response {
    (
        status_for(error.kind),
        Json(ErrorBody {
            error: error.message.clone(),
        }),
    )
        .into_response()
}

fn status_for(kind: IntakeErrorKind) -> StatusCode {
    match kind {
        IntakeErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        IntakeErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        IntakeErrorKind::MissingFields
        | IntakeErrorKind::InvalidEmail
        | IntakeErrorKind::InvalidBody => StatusCode::BAD_REQUEST,
    }
}
