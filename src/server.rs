use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, LINK},
        request::Parts,
        HeaderName, HeaderValue, Method,
    },
    routing::{get, patch, post},
    Router,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::room;
use crate::shared::AppState;
use crate::websockets::subscribe_handler;

/// Build the HTTP router with every route and middleware layer
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/rooms", post(room::create_room).get(room::list_rooms))
        .route(
            "/rooms/:room_id/messages",
            post(room::create_message).get(room::list_messages),
        )
        .route(
            "/rooms/:room_id/messages/:message_id",
            get(room::get_message),
        )
        .route(
            "/rooms/:room_id/messages/:message_id/react",
            patch(room::react_to_message).delete(room::remove_reaction),
        )
        .route(
            "/rooms/:room_id/messages/:message_id/answer",
            patch(room::mark_answered),
        );

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/subscribe/:room_id", get(subscribe_handler))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CatchPanicLayer::new())
                .layer(cors_layer()),
        )
        .with_state(state)
}

/// Browsers on any http(s) origin may call the API; no credentials
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            |origin: &HeaderValue, _request: &Parts| {
                let origin = origin.as_bytes();
                origin.starts_with(b"http://") || origin.starts_with(b"https://")
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([
            ACCEPT,
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([LINK])
        .allow_credentials(false)
        .max_age(Duration::from_secs(300))
}

/// Serve until a shutdown signal arrives or `state.shutdown` is cancelled
///
/// Open subscriptions are children of the shutdown token, so they close and
/// let the graceful shutdown finish.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
        _ = shutdown.cancelled() => {}
    }

    info!("Shutting down");
    shutdown.cancel();
}
