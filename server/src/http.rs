//! HTTP surface for the log service.

use std::net::SocketAddr;
use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::http::header;
use axum::middleware;
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::any;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use logvault_service::LogService;
use tokio::net::TcpListener;
use tracing::info;
use tracing::warn;

use crate::handlers::handle_create;
use crate::handlers::handle_delete;
use crate::handlers::handle_fetch_flag;
use crate::handlers::handle_fetch_id;
use crate::handlers::handle_fetch_timestamp;
use crate::handlers::handle_health;
use crate::handlers::handle_list;
use crate::handlers::handle_root;
use crate::rate_limit::RateLimit;
use crate::rate_limit::limit_requests;

/// Build the router. Handlers receive `service` through axum state. With a
/// `rate_limit`, over-limit clients get 429 before any handler runs.
pub fn router(service: LogService, rate_limit: Option<RateLimit>) -> Router {
    let api = Router::new()
        .route("/health", any(handle_health))
        .route("/create", post(handle_create))
        .route("/list", get(handle_list))
        .route("/fetch/i/{id}", get(handle_fetch_id))
        .route("/fetch/t/{timestamp}", get(handle_fetch_timestamp))
        .route("/fetch/f/{flag}", get(handle_fetch_flag))
        .route("/delete/{id}", delete(handle_delete));

    let mut app: Router<LogService> = Router::new()
        .route("/", get(handle_root))
        .nest("/api", api);
    if let Some(limit) = rate_limit {
        app = app.layer(middleware::from_fn_with_state(limit, limit_requests));
    }
    app.layer(middleware::from_fn(secure_headers))
        .layer(middleware::from_fn(log_requests))
        .with_state(service)
}

/// Serve until Ctrl-C or SIGTERM. Peer addresses are exposed to the rate
/// limiter through `ConnectInfo`.
pub async fn serve(
    listener: TcpListener,
    service: LogService,
    rate_limit: Option<RateLimit>,
) -> anyhow::Result<()> {
    info!("logvault listening on http://{}", listener.local_addr()?);
    let app = router(service, rate_limit).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server shut down gracefully");
    Ok(())
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        %method,
        path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

async fn secure_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );
    response
}

/// Resolve on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
