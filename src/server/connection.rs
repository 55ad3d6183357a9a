// Connection handling
// Accepts a TCP stream, serves HTTP/1 on it and routes every request through the adapter

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, REFERER, USER_AGENT};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, Version};
use hyper_util::rt::TokioIo;

use super::ServerState;
use crate::adapter::{ContextResponse, Payload};
use crate::http::response::build_plain_response;
use crate::http::{build_413_response, into_hyper, RawRequest, RawResponse};
use crate::logger::{self, AccessLogEntry};

/// Check the connection limit, then serve the stream on a local task
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<ServerState>,
) {
    // Increment first, then check the limit
    let prev_count = state.connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, peer_addr, Arc::clone(state));
}

fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<ServerState>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let timeout_duration = std::time::Duration::from_secs(std::cmp::max(
            performance.read_timeout,
            performance.write_timeout,
        ));

        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handle_request(req, Arc::clone(&service_state), peer_addr)),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_warning(&format!(
                "Connection from {peer_addr} timed out after {} seconds",
                timeout_duration.as_secs()
            )),
        }

        state.connections.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Serve one request through the adapter listener
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let start = Instant::now();
    let max_body_size = state.config.http.max_body_size;

    let declared_length = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared_length.is_some_and(|length| length > max_body_size) {
        logger::log_warning(&format!(
            "Request body of {} bytes exceeds the {max_body_size} byte limit",
            declared_length.unwrap_or_default()
        ));
        return Ok(build_413_response());
    }

    let mut entry = access_entry(&req, peer_addr);

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let raw_request = RawRequest::from_hyper(Request::from_parts(parts, Limited::new(body, limit)));
    let mut raw_response = RawResponse::new();

    match state.listener.handle(raw_request, &mut raw_response).await {
        Ok(None) => {}
        Ok(Some(response)) => finish(response, &mut raw_response),
        Err(error) => {
            logger::log_listener_failure(&entry.method, &entry.path, &error);
            if !raw_response.is_ended() {
                let status = raw_response.status().unwrap_or_default();
                let reason = status.canonical_reason().unwrap_or("Error");
                return Ok(build_plain_response(status, reason, false));
            }
        }
    }

    let response = into_hyper(raw_response);

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        entry.media_type = header_string(&response, &CONTENT_TYPE);
        entry.encoding = header_string(&response, &CONTENT_ENCODING);
        entry.request_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Host side of `end_response = false`: write the computed payload and end
fn finish(response: ContextResponse, raw_response: &mut RawResponse) {
    let written = match &response.payload {
        Some(Payload::Bytes(bytes)) => raw_response.write(bytes),
        _ => Ok(()),
    };
    if let Err(e) = written.and_then(|()| raw_response.end()) {
        logger::log_error(&format!("Failed to finish response: {e}"));
    }
}

fn access_entry(req: &Request<Incoming>, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.referer = req
        .headers()
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry.user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry
}

fn header_string(
    response: &Response<Full<Bytes>>,
    name: &hyper::header::HeaderName,
) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}
