//! Route table module
//!
//! An ordered list of (method, pattern) -> handler entries. Lookup is a
//! linear scan in registration order and the first match wins, so the
//! catch-all must be registered last and an earlier duplicate shadows a
//! later one.

use crate::dispatch::static_files::StaticAssetResolver;
use crate::dispatch::time;
use crate::http;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Request data visible to route handlers
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Percent-decoded URI path
    pub path: String,
    pub is_head: bool,
}

/// Abnormal termination of a route handler, distinct from a plain miss.
///
/// Carried as the error arm of a handler's result; the dispatcher converts it
/// into the 500 path.
#[derive(Debug, Clone)]
pub struct Fault {
    message: String,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Fault {}

/// What a route handler produced
pub enum RouteReply {
    /// A terminal response
    Response(Response<Full<Bytes>>),
    /// Defer to the not-found responder
    NotFound,
}

pub type RouteResult = Result<RouteReply, Fault>;
pub type HandlerFuture = Pin<Box<dyn Future<Output = RouteResult> + Send>>;
pub type RouteHandlerFn = Box<dyn Fn(RequestContext) -> HandlerFuture + Send + Sync>;

/// Path matching rule for a route entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Match the path exactly
    Exact(String),
    /// Match any path starting with the prefix
    Prefix(String),
    /// Match every path
    Any,
}

impl Pattern {
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Self::Any => true,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(path) => f.write_str(path),
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
            Self::Any => f.write_str("*"),
        }
    }
}

/// A single registered route
pub struct RouteEntry {
    name: &'static str,
    /// `None` matches every method (used by the catch-all)
    method: Option<Method>,
    pattern: Pattern,
    handler: RouteHandlerFn,
}

impl RouteEntry {
    /// HEAD is served wherever GET is registered; the body is elided later.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        let method_ok = self.method.as_ref().map_or(true, |m| {
            m == method || (*m == Method::GET && *method == Method::HEAD)
        });
        method_ok && self.pattern.matches(path)
    }

    pub async fn invoke(&self, ctx: RequestContext) -> RouteResult {
        (self.handler)(ctx).await
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub const fn pattern(&self) -> &Pattern {
        &self.pattern
    }
}

/// Ordered route table; first match wins
#[derive(Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a route.
    ///
    /// Duplicate (method, pattern) pairs are permitted; the first registered
    /// wins at lookup time and later duplicates are unreachable. Registration
    /// does not detect that.
    pub fn register(
        &mut self,
        name: &'static str,
        method: Option<Method>,
        pattern: Pattern,
        handler: RouteHandlerFn,
    ) {
        self.entries.push(RouteEntry {
            name,
            method,
            pattern,
            handler,
        });
    }

    /// Find the first entry matching method and path, in registration order.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.matches(method, path))
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }
}

/// Build the route table: the page documents, the time endpoint, and the
/// catch-all, in that order. Page routes match exactly; the API group matches
/// by prefix.
pub fn build_routes(assets: &Arc<StaticAssetResolver>) -> RouteTable {
    let mut table = RouteTable::new();
    table.register(
        "home",
        Some(Method::GET),
        Pattern::Exact("/".to_string()),
        document_handler(assets, "index.html"),
    );
    table.register(
        "about",
        Some(Method::GET),
        Pattern::Exact("/about".to_string()),
        document_handler(assets, "about.html"),
    );
    table.register(
        "contact",
        Some(Method::GET),
        Pattern::Exact("/contact".to_string()),
        document_handler(assets, "contact.html"),
    );
    table.register(
        "time",
        Some(Method::GET),
        Pattern::Prefix("/api/time".to_string()),
        time_handler(),
    );
    table.register("not-found", None, Pattern::Any, not_found_handler());
    table
}

/// Serve a fixed document from the static root.
///
/// A thin alias over the asset resolver; a missing document defers to the
/// not-found responder rather than faulting.
fn document_handler(assets: &Arc<StaticAssetResolver>, file: &'static str) -> RouteHandlerFn {
    let assets = Arc::clone(assets);
    Box::new(move |ctx| {
        let assets = Arc::clone(&assets);
        Box::pin(async move {
            match assets.read_document(file).await {
                Some(body) => Ok(RouteReply::Response(http::build_document_response(
                    body,
                    StatusCode::OK,
                    ctx.is_head,
                ))),
                None => Ok(RouteReply::NotFound),
            }
        })
    })
}

/// Respond with the current time as JSON.
fn time_handler() -> RouteHandlerFn {
    Box::new(|ctx| {
        Box::pin(async move {
            let payload = time::current_time();
            Ok(RouteReply::Response(http::build_json_response(
                StatusCode::OK,
                &payload,
                ctx.is_head,
            )))
        })
    })
}

/// The catch-all: always defers to the not-found responder.
fn not_found_handler() -> RouteHandlerFn {
    Box::new(|_ctx| Box::pin(async { Ok(RouteReply::NotFound) }))
}
