//! HTTP response building module
//!
//! Turns a finished [`RawResponse`] into a hyper response, plus the few
//! responses the server produces before the adapter is involved.

use super::transport::RawResponse;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};

/// Convert a buffered response into a hyper response
pub fn into_hyper(raw: RawResponse) -> Response<Full<Bytes>> {
    let (status, headers, body) = raw.into_parts();
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_plain_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large", true)
}

/// Build a plain text response, optionally closing the connection
pub fn build_plain_response(
    status: StatusCode,
    text: &'static str,
    close: bool,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, text.len());
    if close {
        builder = builder.header(CONNECTION, HeaderValue::from_static("close"));
    }
    builder
        .body(Full::new(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from_static(text.as_bytes())))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::ETAG;

    #[tokio::test]
    async fn test_into_hyper_keeps_parts() {
        let mut raw = RawResponse::new();
        raw.set_status(StatusCode::CREATED);
        raw.set_header(ETAG, HeaderValue::from_static("W/1"));
        raw.write(b"done").unwrap();
        raw.end().unwrap();

        let response = into_hyper(raw);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[ETAG], "W/1");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "done");
    }

    #[test]
    fn test_413() {
        let response = build_413_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[CONNECTION], "close");
        assert_eq!(response.headers()[CONTENT_LENGTH], "21");
    }
}
