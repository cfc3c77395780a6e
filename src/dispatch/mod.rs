//! Request dispatch module
//!
//! Entry point for HTTP request processing: an ordered pipeline that tries
//! static assets first, then registered routes, then the not-found responder,
//! and converts handler faults into a well-formed 500. Exactly one response
//! is produced per request and no fault escapes this boundary.

pub mod routes;
pub mod static_files;
pub mod time;

pub use routes::{Fault, Pattern, RequestContext, RouteReply, RouteTable};

use crate::config::AppState;
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Fixed plain-text body when the not-found document is unavailable
pub const NOT_FOUND_FALLBACK: &str = "404 - Page Not Found";
/// Fixed plain-text body when the server-error document is unavailable
pub const SERVER_ERROR_FALLBACK: &str = "500 - Internal Server Error";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let method = req.method().clone();
    let is_head = method == Method::HEAD;
    let raw_path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let http_version = version_str(req.version());
    let referer = header_value(&req, "referer");
    let user_agent = header_value(&req, "user-agent");

    let response = match decode_path(&raw_path) {
        Some(path) => {
            let ctx = RequestContext {
                method: method.clone(),
                path,
                is_head,
            };
            dispatch(&ctx, &state).await
        }
        // An undecodable path can never name an asset or a route
        None => not_found_response(&state, is_head).await,
    };

    if state.config.logging.access_log {
        let entry = logger::AccessLogEntry {
            remote_addr: peer_addr.ip().to_string(),
            time: chrono::Local::now(),
            method: method.to_string(),
            path: raw_path,
            query,
            http_version: http_version.to_string(),
            status: response.status().as_u16(),
            body_bytes: content_length_of(&response),
            referer,
            user_agent,
            request_time_us: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        };
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Run one request through the dispatch pipeline.
///
/// Stage order is fixed: static assets, then routes in registration order,
/// then the not-found responder. The fault responder runs only when a route
/// handler faulted, never on a plain miss.
async fn dispatch(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    // TryStatic: safe methods only
    if matches!(ctx.method, Method::GET | Method::HEAD) {
        if let Some(asset) = state.assets.resolve(&ctx.path).await {
            return http::build_asset_response(&asset.bytes, asset.content_type, ctx.is_head);
        }
    }

    // TryRoutes: first match in registration order. A miss is only possible
    // when no catch-all is registered.
    let outcome = match state.routes.lookup(&ctx.method, &ctx.path) {
        Some(entry) => entry.invoke(ctx.clone()).await,
        None => Ok(RouteReply::NotFound),
    };

    match outcome {
        Ok(RouteReply::Response(response)) => response,
        Ok(RouteReply::NotFound) => not_found_response(state, ctx.is_head).await,
        Err(fault) => fault_response(&fault, state, ctx.is_head).await,
    }
}

/// Not-found responder: the configured document, or the fixed plain text.
async fn not_found_response(state: &AppState, is_head: bool) -> Response<Full<Bytes>> {
    match state
        .assets
        .read_document(&state.config.site.not_found_document)
        .await
    {
        Some(body) => http::build_document_response(body, StatusCode::NOT_FOUND, is_head),
        None => http::build_plain_response(StatusCode::NOT_FOUND, NOT_FOUND_FALLBACK),
    }
}

/// Fault responder: record the fault once, then respond without leaking any
/// detail to the client. Document resolution failure degrades unconditionally
/// to the fixed plain text.
async fn fault_response(fault: &Fault, state: &AppState, is_head: bool) -> Response<Full<Bytes>> {
    logger::log_handler_fault(fault);
    match state
        .assets
        .read_document(&state.config.site.error_document)
        .await
    {
        Some(body) => http::build_document_response(body, StatusCode::INTERNAL_SERVER_ERROR, is_head),
        None => http::build_plain_response(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_FALLBACK),
    }
}

/// Percent-decode the request path; `None` when the escapes are not valid
/// UTF-8.
fn decode_path(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|path| path.into_owned())
}

fn header_value<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn content_length_of(response: &Response<Full<Bytes>>) -> usize {
    response
        .headers()
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn version_str(version: hyper::Version) -> &'static str {
    if version == hyper::Version::HTTP_10 {
        "1.0"
    } else if version == hyper::Version::HTTP_2 {
        "2"
    } else if version == hyper::Version::HTTP_3 {
        "3"
    } else {
        "1.1"
    }
}

#[cfg(test)]
mod tests {
    use super::routes::{RouteHandlerFn, RouteTable};
    use super::static_files::StaticAssetResolver;
    use super::*;
    use crate::config::{Config, LoggingConfig, ServerConfig, SiteConfig};
    use http_body_util::BodyExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_config(root: &Path) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            logging: LoggingConfig {
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            site: SiteConfig {
                root: root.display().to_string(),
                not_found_document: "404.html".to_string(),
                error_document: "500.html".to_string(),
            },
        }
    }

    fn state_for(dir: &TempDir) -> Arc<AppState> {
        Arc::new(AppState::new(test_config(dir.path())))
    }

    fn faulting_handler() -> RouteHandlerFn {
        Box::new(|_ctx| Box::pin(async { Err(Fault::new("simulated handler failure")) }))
    }

    /// State whose route table has a faulting handler ahead of the catch-all
    fn state_with_faulting_route(dir: &TempDir) -> Arc<AppState> {
        let config = test_config(dir.path());
        let assets = Arc::new(StaticAssetResolver::new(&config.site.root));
        let mut routes = RouteTable::new();
        routes.register(
            "boom",
            Some(Method::GET),
            Pattern::Exact("/boom".to_string()),
            faulting_handler(),
        );
        routes.register(
            "not-found",
            None,
            Pattern::Any,
            Box::new(|_ctx| Box::pin(async { Ok(RouteReply::NotFound) })),
        );
        Arc::new(AppState {
            config,
            assets,
            routes,
        })
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn request(method: Method, uri: &str) -> Request<()> {
        Request::builder().method(method).uri(uri).body(()).unwrap()
    }

    async fn send(state: &Arc<AppState>, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = handle_request(request(method, uri), peer(), Arc::clone(state))
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_page_routes_serve_their_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), b"<p>home</p>").unwrap();
        std::fs::write(dir.path().join("about.html"), b"<p>about</p>").unwrap();
        std::fs::write(dir.path().join("contact.html"), b"<p>contact</p>").unwrap();
        let state = state_for(&dir);

        let (status, body) = send(&state, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<p>home</p>");

        let (status, body) = send(&state, Method::GET, "/about").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<p>about</p>");

        let (status, body) = send(&state, Method::GET, "/contact").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<p>contact</p>");
    }

    #[tokio::test]
    async fn test_static_asset_served_with_inferred_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("styles")).unwrap();
        std::fs::write(dir.path().join("styles/site.css"), b"body {}").unwrap();
        let state = state_for(&dir);

        let response = handle_request(request(Method::GET, "/styles/site.css"), peer(), state)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/css"
        );
    }

    #[tokio::test]
    async fn test_missing_asset_falls_through_to_plain_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(&dir);

        let (status, body) = send(&state, Method::GET, "/styles/missing.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, NOT_FOUND_FALLBACK.as_bytes());
    }

    #[tokio::test]
    async fn test_not_found_document_preferred_over_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("404.html"), b"<h1>lost</h1>").unwrap();
        let state = state_for(&dir);

        let (status, body) = send(&state, Method::GET, "/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"<h1>lost</h1>");
    }

    #[tokio::test]
    async fn test_time_endpoint_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(&dir);

        let response = handle_request(request(Method::GET, "/api/time"), peer(), state)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);

        let datetime = object["datetime"].as_str().unwrap();
        let timestamp = object["timestamp"].as_i64().unwrap();
        let parsed = chrono::DateTime::parse_from_rfc3339(datetime).unwrap();
        assert_eq!(parsed.timestamp_millis(), timestamp);
    }

    #[tokio::test]
    async fn test_fault_yields_plain_500_without_detail() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_faulting_route(&dir);

        let (status, body) = send(&state, Method::GET, "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, SERVER_ERROR_FALLBACK.as_bytes());
    }

    #[tokio::test]
    async fn test_fault_prefers_error_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("500.html"), b"<h1>oops</h1>").unwrap();
        let state = state_with_faulting_route(&dir);

        let (status, body) = send(&state, Method::GET, "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, b"<h1>oops</h1>");
    }

    #[tokio::test]
    async fn test_unmatched_method_is_404_not_405() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("about.html"), b"<p>about</p>").unwrap();
        let state = state_for(&dir);

        let (status, _) = send(&state, Method::POST, "/about").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_resolution_wins_over_named_route() {
        // A file literally named "about" under the root shadows the route
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("about"), b"raw file").unwrap();
        std::fs::write(dir.path().join("about.html"), b"<p>about</p>").unwrap();
        let state = state_for(&dir);

        let (status, body) = send(&state, Method::GET, "/about").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"raw file");
    }

    #[tokio::test]
    async fn test_head_elides_body_but_keeps_length() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), b"<p>home</p>").unwrap();
        let state = state_for(&dir);

        let response = handle_request(request(Method::HEAD, "/"), peer(), state)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Content-Length").unwrap(), "11");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_encoded_traversal_never_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(&dir);

        let (status, _) = send(&state, Method::GET, "/%2e%2e/%2e%2e/etc/passwd").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_percent_encoded_asset_path_resolves() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("styles")).unwrap();
        std::fs::write(dir.path().join("styles/site.css"), b"body {}").unwrap();
        let state = state_for(&dir);

        let (status, body) = send(&state, Method::GET, "/styles%2Fsite.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"body {}");
    }

    #[test]
    fn test_decode_path_rejects_invalid_utf8() {
        assert_eq!(decode_path("/%ff"), None);
        assert_eq!(decode_path("/a%20b"), Some("/a b".to_string()));
        assert_eq!(decode_path("/plain"), Some("/plain".to_string()));
    }
}
