use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use metrics::histogram;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{application::error::ErrorReport, infra::db::QueryCounter};

pub const RESPONSE_TIME_HEADER: HeaderName = HeaderName::from_static("x-response-time-ms");
pub const QUERY_COUNT_HEADER: HeaderName = HeaderName::from_static("x-query-count");
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Per-request state handed to handlers through request extensions.
///
/// `queries` is the only counter the request's services charge statements
/// to; clones share it, so work done on spawned tasks is still counted.
#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub queries: QueryCounter,
}

/// Bracket every request with timing and statement counting, and report
/// both as response headers on every outcome, error responses included.
pub async fn instrument_request(mut request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let ctx = RequestContext {
        request_id: Uuid::new_v4().to_string(),
        queries: QueryCounter::new(),
    };
    ctx.queries.reset();
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!("quillpost_http_request_ms").record(elapsed_ms);

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&format!("{elapsed_ms:.2}")) {
        headers.insert(RESPONSE_TIME_HEADER, value);
    }
    headers.insert(QUERY_COUNT_HEADER, HeaderValue::from(ctx.queries.get()));
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }

    response.extensions_mut().insert(ctx);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let (request_id, queries) = match request.extensions().get::<RequestContext>() {
        Some(ctx) => (ctx.request_id.clone(), Some(ctx.queries.clone())),
        None => (String::new(), None),
    };

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let query_count = queries.map(|q| q.get()).unwrap_or_default();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "quillpost::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                query_count = query_count,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "request failed",
            );
        } else {
            warn!(
                target = "quillpost::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                query_count = query_count,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "client request error",
            );
        }
    }

    response
}
