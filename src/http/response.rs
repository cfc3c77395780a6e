//! HTTP response building module
//!
//! Builders for every response shape the dispatcher produces. Each builder is
//! total: if response assembly itself fails, a minimal degraded response is
//! returned instead of propagating the error up the fault path.

use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Build a 200 response carrying a static asset.
pub fn build_asset_response(
    data: &[u8],
    content_type: &'static str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(data.to_owned())
    };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("asset", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build an HTML document response with the given status code.
///
/// Used for the page routes (200) and the 404/500 fallback documents.
pub fn build_document_response(
    content: Vec<u8>,
    status: StatusCode,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length);
    if status == StatusCode::OK {
        builder = builder.header("Cache-Control", "public, max-age=3600");
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("document", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build a fixed plain-text response.
///
/// The terminal fallback for 404/500 when the configured document cannot be
/// read; must never fail, so the degraded branch reuses the same body.
pub fn build_plain_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .header("Content-Length", text.len())
        .body(Full::new(Bytes::from(text)))
        .unwrap_or_else(|e| {
            log_build_error("plain", &e);
            Response::new(Full::new(Bytes::from(text)))
        })
}

/// Build a JSON response from a serializable value.
///
/// Serialization failure degrades to a generic JSON 500 body.
pub fn build_json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string(value) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response body: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(
                    r#"{"error":"Internal Server Error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())));
        }
    };

    let content_length = json.len();
    let body = if is_head { Bytes::new() } else { Bytes::from(json) };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log a response build error
fn log_build_error(kind: &str, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {kind} response: {error}"));
}
