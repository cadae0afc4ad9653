//! Reverse proxy mode
//!
//! Every request is forwarded to the upstream through the interceptor, so a
//! browser pointed at the proxy gets enlarged, filled list pages. Control
//! endpoints live under `/__pagefill/`.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use url::Url;

use crate::error::{Error, Result};
use crate::export::Exporter;
use crate::http::Transport;
use crate::intercept::Interceptor;
use crate::request::{RequestBody, RequestDescriptor, ResponseSnapshot};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL requests are forwarded to
    pub upstream: String,
}

/// App state shared across handlers
struct AppState<T> {
    config: ServerConfig,
    interceptor: Interceptor<T>,
}

/// Request body for the page size endpoint
#[derive(Debug, Deserialize)]
struct PageSizeRequest {
    value: u64,
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Headers that describe one connection and are never forwarded
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Build the proxy router
pub fn router<T: Transport + 'static>(config: ServerConfig, interceptor: Interceptor<T>) -> Router {
    let state = Arc::new(AppState {
        config,
        interceptor,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/__pagefill/health", get(health))
        .route("/__pagefill/status", get(status::<T>))
        .route("/__pagefill/page-size", put(set_page_size::<T>))
        .route("/__pagefill/export", get(export::<T>))
        .fallback(proxy::<T>)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the proxy server
pub async fn serve<T: Transport + 'static>(
    config: ServerConfig,
    interceptor: Interceptor<T>,
    port: u16,
) -> Result<()> {
    Url::parse(&config.upstream)?;
    let upstream = config.upstream.clone();
    let app = router(config, interceptor);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Proxying http://{} to {}", addr, upstream);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Gate state and the most recent aggregation
async fn status<T: Transport + 'static>(State(state): State<Arc<AppState<T>>>) -> Response {
    let interceptor = &state.interceptor;
    let desired = interceptor.settings().desired_page_size().await;
    let data = json!({
        "enabled": interceptor.config().is_enabled_for(desired),
        "desired_page_size": desired,
        "enable_threshold": interceptor.config().enable_threshold,
        "last_request": interceptor.last_request().await.map(|c| c.request.url.to_string()),
        "last_summary": interceptor.last_summary().await,
    });
    Json(ApiResponse::success(data)).into_response()
}

/// Persist a new desired page size
async fn set_page_size<T: Transport + 'static>(
    State(state): State<Arc<AppState<T>>>,
    Json(req): Json<PageSizeRequest>,
) -> Response {
    let settings = state.interceptor.settings();
    match settings.set_desired_page_size(req.value).await {
        Ok(()) => {
            let desired = settings.desired_page_size().await;
            Json(ApiResponse::success(json!({
                "desired_page_size": desired,
                "enabled": state.interceptor.config().is_enabled_for(desired),
            })))
            .into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(e.to_string())),
        )
            .into_response(),
    }
}

/// CSV download of the last captured query
async fn export<T: Transport + 'static>(State(state): State<Arc<AppState<T>>>) -> Response {
    let exporter = Exporter::new(state.interceptor.clone());
    match exporter.export().await {
        Ok(file) => {
            let disposition = format!("attachment; filename=\"{}\"", file.filename);
            let mut response = Response::new(Body::from(file.contents));
            let headers = response.headers_mut();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            );
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            response
        }
        Err(e) => {
            tracing::warn!("Export failed: {e}");
            let status = match &e {
                Error::NothingCaptured | Error::NoData => StatusCode::NOT_FOUND,
                Error::Export { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Forward anything else to the upstream through the interceptor
async fn proxy<T: Transport + 'static>(
    State(state): State<Arc<AppState<T>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match upstream_request(&state.config.upstream, method, &uri, &headers, body) {
        Ok(request) => request,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match state.interceptor.handle(&request).await {
        Ok(snapshot) => into_response(snapshot),
        Err(e) => {
            tracing::warn!("Upstream request to {} failed: {e}", request.url);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

/// Rebase an incoming request onto the upstream
pub(crate) fn upstream_request(
    upstream: &str,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<RequestDescriptor> {
    let path = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let url = format!("{}{}", upstream.trim_end_matches('/'), path);
    let mut request = RequestDescriptor::new(method, &url)?;

    for (name, value) in headers {
        // the upstream picks its own host, and must answer uncompressed so
        // list payloads can be read
        if is_hop_by_hop(name) || *name == header::HOST || *name == header::ACCEPT_ENCODING {
            continue;
        }
        request.headers.append(name.clone(), value.clone());
    }

    if !body.is_empty() {
        let multipart = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/"));
        let body = if multipart {
            RequestBody::Binary(body)
        } else {
            match String::from_utf8(body.to_vec()) {
                Ok(text) => RequestBody::Text(text),
                Err(_) => RequestBody::Binary(body),
            }
        };
        request = request.with_body(body);
    }

    Ok(request)
}

/// Turn a snapshot into the proxy's response
pub(crate) fn into_response(snapshot: ResponseSnapshot) -> Response {
    let mut response = Response::new(Body::from(snapshot.body));
    *response.status_mut() = snapshot.status;

    let headers = response.headers_mut();
    for (name, value) in &snapshot.headers {
        if is_hop_by_hop(name) || *name == header::CONTENT_LENGTH {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    response
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}
