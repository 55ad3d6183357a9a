//! Response finalizer
//!
//! Normalises a [`ContextResponse`] into transport bytes exactly once:
//!
//! 1. status from the [`StatusMap`] unless someone already set one
//! 2. `Connection: keep-alive` unless the client asked to close
//! 3. payload normalisation (compression, `Content-Length`, empty handling)
//! 4. header flush
//! 5. weak `ETag` and conditional GET, computed on the compressed bytes
//! 6. body write and end
//!
//! Any failure is turned into a `text/plain` fallback and the response is
//! ended on every path.

use super::messages::{self, Messages};
use super::{ContextResponse, Error, Meta, Payload, Settings, StatusMap};
use crate::http::cache::{is_fresh, weak_etag};
use crate::http::compress::{self, Encoding};
use crate::http::transport::{RawRequest, RawResponse};
use crate::logger;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, ETAG, IF_NONE_MATCH,
};
use hyper::StatusCode;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone)]
pub struct Finalizer {
    pub(crate) settings: Settings,
    pub(crate) status_map: StatusMap,
    pub(crate) messages: Messages,
}

impl Finalizer {
    pub const fn new(settings: Settings, status_map: StatusMap, messages: Messages) -> Self {
        Self {
            settings,
            status_map,
            messages,
        }
    }

    /// Finalize a response or an error.
    ///
    /// Returns `Ok(Some(response))` when `end_response` is off and the host
    /// owns termination, `Ok(None)` once the response has been ended. On
    /// `Err` the fallback body has already been written and the response
    /// ended.
    pub async fn finalize(
        &self,
        input: Result<ContextResponse, Error>,
        encoding: Option<Encoding>,
        language: Option<&str>,
        raw_request: &RawRequest,
        raw_response: &mut RawResponse,
    ) -> Result<Option<ContextResponse>, Error> {
        match self
            .try_finalize(input, encoding, language, raw_request, raw_response)
            .await
        {
            Ok(done) => Ok(done),
            Err(error) => {
                if let Err(fallback_error) = self.fallback(&error, raw_response) {
                    logger::log_error(&format!(
                        "Failed to write fallback response for '{error}': {fallback_error}"
                    ));
                    self.last_resort(raw_response, language);
                }
                Err(error)
            }
        }
    }

    async fn try_finalize(
        &self,
        input: Result<ContextResponse, Error>,
        encoding: Option<Encoding>,
        language: Option<&str>,
        raw_request: &RawRequest,
        raw_response: &mut RawResponse,
    ) -> Result<Option<ContextResponse>, Error> {
        let kind = match &input {
            Ok(response) => response.kind,
            Err(error) => error.kind(),
        };
        if raw_response.status().is_none() {
            raw_response.set_status(self.status_map.get(kind));
        }

        let close = raw_request
            .header(CONNECTION)
            .is_some_and(|value| value.eq_ignore_ascii_case("close"));
        if !close {
            raw_response.set_header(CONNECTION, HeaderValue::from_static("keep-alive"));
        }

        // Errors nobody attached response data to are not written here
        let mut response = match input {
            Ok(response) => response,
            Err(Error::Domain(error)) if error.is_augmented() => error.into_response(),
            Err(error) => return Err(error),
        };

        let body = match response.payload.take() {
            Some(payload @ Payload::Value(_)) if !payload.is_falsy() => {
                raw_response.set_status(self.status_map.generic_error());
                return Err(Error::other(self.messages.translate(
                    messages::INVALID_PAYLOAD_TYPE,
                    language,
                    &[],
                )));
            }
            Some(payload) if !payload.is_falsy() => {
                let bytes = match payload {
                    Payload::Bytes(bytes) => bytes,
                    Payload::Text(text) => Bytes::from(text),
                    Payload::Value(_) => Bytes::new(),
                };
                let bytes = match encoding {
                    Some(encoding) => compress::compress(encoding, bytes).await?,
                    None => {
                        raw_response.remove_header(&CONTENT_ENCODING);
                        bytes
                    }
                };
                response
                    .meta
                    .headers
                    .insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
                bytes
            }
            _ => {
                raw_response.remove_header(&CONTENT_ENCODING);
                raw_response.remove_header(&CONTENT_TYPE);
                if raw_response.status() == Some(self.status_map.ok()) {
                    raw_response.set_status(self.status_map.empty());
                }
                Bytes::new()
            }
        };
        response.payload = Some(Payload::Bytes(body.clone()));

        flush_headers(&response.meta, raw_response);

        if self.settings.use_etag && !body.is_empty() {
            let etag = weak_etag(&body);
            let value = HeaderValue::from_str(&etag).map_err(Error::other)?;
            raw_response.set_header(ETAG, value.clone());
            response.meta.headers.insert(ETAG, value);

            if !self.settings.end_response {
                return Ok(Some(response));
            }

            if is_fresh(raw_request.header(IF_NONE_MATCH), &etag) {
                raw_response.set_status(StatusCode::NOT_MODIFIED);
                raw_response.remove_header(&CONTENT_ENCODING);
                raw_response.remove_header(&CONTENT_TYPE);
                raw_response.remove_header(&CONTENT_LENGTH);
                raw_response.end()?;
                return Ok(None);
            }
        } else if !self.settings.end_response {
            return Ok(Some(response));
        }

        raw_response.write(&body)?;
        raw_response.end()?;
        Ok(None)
    }

    /// Plain text rendering of the failure
    fn fallback(&self, error: &Error, raw_response: &mut RawResponse) -> Result<(), Error> {
        if raw_response.status().is_none() {
            raw_response.set_status(self.status_map.generic_error());
        }
        write_plain(raw_response, &error.to_string())
    }

    /// End the response with the generic message if it is still open
    pub fn last_resort(&self, raw_response: &mut RawResponse, language: Option<&str>) {
        if raw_response.is_ended() {
            return;
        }
        if raw_response.status().is_none() {
            raw_response.set_status(self.status_map.generic_error());
        }
        let text = self
            .messages
            .translate(messages::GENERIC_ERROR, language, &[]);
        if let Err(e) = write_plain(raw_response, &text) {
            logger::log_error(&format!("Failed to end response: {e}"));
        }
    }
}

/// Copy meta headers onto the transport; meta values replace existing ones
fn flush_headers(meta: &Meta, raw_response: &mut RawResponse) {
    for name in meta.headers.keys() {
        raw_response.remove_header(name);
        for value in meta.headers.get_all(name) {
            raw_response.append_header(name.clone(), value.clone());
        }
    }
}

fn write_plain(raw_response: &mut RawResponse, text: &str) -> Result<(), Error> {
    raw_response.clear_headers();
    raw_response.set_header(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    raw_response.set_header(CONTENT_LENGTH, HeaderValue::from(text.len()));
    raw_response.write(text.as_bytes())?;
    raw_response.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{DomainError, ResponseKind};
    use crate::http::transport::RequestBody;
    use flate2::read::GzDecoder;
    use hyper::header::HeaderName;
    use hyper::{HeaderMap, Method, Uri};
    use serde_json::json;
    use std::io::Read;

    fn finalizer(settings: Settings) -> Finalizer {
        Finalizer::new(settings, StatusMap::default(), Messages::default())
    }

    fn request(headers: &[(HeaderName, &'static str)]) -> RawRequest {
        let headers: HeaderMap = headers
            .iter()
            .map(|(k, v)| (k.clone(), HeaderValue::from_static(*v)))
            .collect();
        RawRequest::new(Method::GET, Uri::from_static("/"), headers, RequestBody::Empty)
    }

    async fn run(
        finalizer: &Finalizer,
        input: Result<ContextResponse, Error>,
        encoding: Option<Encoding>,
        req: &RawRequest,
    ) -> (RawResponse, Result<Option<ContextResponse>, Error>) {
        let mut res = RawResponse::new();
        let result = finalizer.finalize(input, encoding, None, req, &mut res).await;
        (res, result)
    }

    #[tokio::test]
    async fn test_bytes_payload_sets_length() {
        let f = finalizer(Settings {
            use_etag: false,
            ..Settings::default()
        });
        let req = request(&[]);
        let response = ContextResponse::ok(Bytes::from_static(b"0123456789"));
        let (res, result) = run(&f, Ok(response), None, &req).await;
        assert!(matches!(result, Ok(None)));
        assert_eq!(res.status(), Some(StatusCode::OK));
        assert_eq!(res.header(CONTENT_LENGTH), Some("10"));
        assert_eq!(res.header(CONNECTION), Some("keep-alive"));
        assert!(res.header(ETAG).is_none());
        assert_eq!(res.body(), b"0123456789");
        assert!(res.is_ended());
    }

    #[tokio::test]
    async fn test_connection_close_respected() {
        let f = finalizer(Settings::default());
        let req = request(&[(CONNECTION, "Close")]);
        let (res, _) = run(&f, Ok(ContextResponse::ok("x")), None, &req).await;
        assert!(res.header(CONNECTION).is_none());
    }

    #[tokio::test]
    async fn test_empty_payload_downgrades_ok() {
        let f = finalizer(Settings::default());
        let req = request(&[]);
        let mut res = RawResponse::new();
        res.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        res.set_header(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        let result = f
            .finalize(
                Ok(ContextResponse::new(ResponseKind::Ok)),
                Some(Encoding::Gzip),
                None,
                &req,
                &mut res,
            )
            .await;
        assert!(matches!(result, Ok(None)));
        assert_eq!(res.status(), Some(StatusCode::NO_CONTENT));
        assert!(res.header(CONTENT_TYPE).is_none());
        assert!(res.header(CONTENT_ENCODING).is_none());
        assert!(res.body().is_empty());
        assert!(res.is_ended());
    }

    #[tokio::test]
    async fn test_created_with_empty_payload_keeps_status() {
        let f = finalizer(Settings::default());
        let req = request(&[]);
        let (res, _) = run(&f, Ok(ContextResponse::new(ResponseKind::Created)), None, &req).await;
        assert_eq!(res.status(), Some(StatusCode::CREATED));
    }

    #[tokio::test]
    async fn test_structured_payload_is_rejected() {
        let f = finalizer(Settings::default());
        let req = request(&[]);
        let (res, result) = run(&f, Ok(ContextResponse::ok(json!({"a": 1}))), None, &req).await;
        let error = result.unwrap_err();
        assert_eq!(error.to_string(), "Error: Response payload type is invalid.");
        assert_eq!(res.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(res.header(CONTENT_TYPE), Some(TEXT_PLAIN));
        assert_eq!(res.body(), error.to_string().as_bytes());
        assert!(res.is_ended());
    }

    #[tokio::test]
    async fn test_falsy_values_are_empty() {
        let f = finalizer(Settings::default());
        let req = request(&[]);
        for value in [json!(false), json!(0), json!("")] {
            let (res, result) = run(&f, Ok(ContextResponse::ok(value)), None, &req).await;
            assert!(matches!(result, Ok(None)));
            assert_eq!(res.status(), Some(StatusCode::NO_CONTENT));
            assert!(res.body().is_empty());
        }
    }

    #[tokio::test]
    async fn test_plain_error_falls_back_to_text() {
        let f = finalizer(Settings::default());
        let req = request(&[]);
        let error = Error::from(DomainError::not_found("gone"));
        let (res, result) = run(&f, Err(error), None, &req).await;
        assert!(result.is_err());
        assert_eq!(res.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(res.body(), b"NotFoundError: gone");
        assert!(res.is_ended());
    }

    #[tokio::test]
    async fn test_augmented_error_is_written() {
        let f = finalizer(Settings::default());
        let req = request(&[]);
        let error = Error::from(
            DomainError::new(ResponseKind::Conflict, "taken").with_payload("taken"),
        );
        let (res, result) = run(&f, Err(error), None, &req).await;
        assert!(matches!(result, Ok(None)));
        assert_eq!(res.status(), Some(StatusCode::CONFLICT));
        assert_eq!(res.body(), b"taken");
    }

    #[tokio::test]
    async fn test_preset_status_is_kept() {
        let f = finalizer(Settings::default());
        let req = request(&[]);
        let mut res = RawResponse::new();
        res.set_status(StatusCode::FOUND);
        let result = f
            .finalize(Ok(ContextResponse::ok("moved")), None, None, &req, &mut res)
            .await;
        assert!(result.is_ok());
        assert_eq!(res.status(), Some(StatusCode::FOUND));
    }

    #[tokio::test]
    async fn test_gzip_compression_and_etag_after_compression() {
        let f = finalizer(Settings::default());
        let req = request(&[]);
        let mut res = RawResponse::new();
        res.set_header(CONTENT_ENCODING, Encoding::Gzip.header_value());
        let payload = Bytes::from_static(b"compress me, compress me, compress me");
        let result = f
            .finalize(
                Ok(ContextResponse::ok(payload.clone())),
                Some(Encoding::Gzip),
                None,
                &req,
                &mut res,
            )
            .await;
        assert!(matches!(result, Ok(None)));
        assert_eq!(res.header(CONTENT_ENCODING), Some("gzip"));
        let length = res.body().len().to_string();
        assert_eq!(res.header(CONTENT_LENGTH), Some(length.as_str()));
        assert_eq!(res.header(ETAG), Some(weak_etag(res.body()).as_str()));

        let mut out = Vec::new();
        GzDecoder::new(res.body()).read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
    }

    #[tokio::test]
    async fn test_conditional_get_returns_304() {
        let f = finalizer(Settings::default());
        let etag = weak_etag(b"cached");
        let req = RawRequest::new(
            Method::GET,
            Uri::from_static("/"),
            std::iter::once((IF_NONE_MATCH, HeaderValue::from_str(&etag).unwrap())).collect(),
            RequestBody::Empty,
        );
        let mut res = RawResponse::new();
        res.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let result = f
            .finalize(Ok(ContextResponse::ok("cached")), None, None, &req, &mut res)
            .await;
        assert!(matches!(result, Ok(None)));
        assert_eq!(res.status(), Some(StatusCode::NOT_MODIFIED));
        assert!(res.body().is_empty());
        assert!(res.header(CONTENT_LENGTH).is_none());
        assert!(res.header(CONTENT_TYPE).is_none());
        assert_eq!(res.header(ETAG), Some(etag.as_str()));
        assert!(res.is_ended());
    }

    #[tokio::test]
    async fn test_host_owned_termination() {
        let f = finalizer(Settings {
            end_response: false,
            ..Settings::default()
        });
        let req = request(&[]);
        let (res, result) = run(&f, Ok(ContextResponse::ok("abc")), None, &req).await;
        let response = result.unwrap().unwrap();
        assert!(!res.is_ended());
        assert!(res.body().is_empty());
        assert_eq!(response.payload, Some(Payload::Bytes(Bytes::from_static(b"abc"))));
        assert_eq!(response.meta.headers[CONTENT_LENGTH], "3");
        assert_eq!(response.meta.headers[ETAG], weak_etag(b"abc").as_str());
    }

    #[tokio::test]
    async fn test_meta_headers_flushed() {
        let f = finalizer(Settings::default());
        let req = request(&[]);
        let mut meta = Meta::default();
        meta.headers.insert(
            HeaderName::from_static("x-total"),
            HeaderValue::from_static("42"),
        );
        let (res, _) = run(&f, Ok(ContextResponse::ok("x").with_meta(meta)), None, &req).await;
        assert_eq!(res.header("x-total"), Some("42"));
    }

    #[tokio::test]
    async fn test_last_resort_ends_open_response() {
        let f = finalizer(Settings::default());
        let mut res = RawResponse::new();
        f.last_resort(&mut res, None);
        assert_eq!(res.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(res.body(), b"An internal error occurred.");
        assert!(res.is_ended());

        // Already ended: untouched
        f.last_resort(&mut res, None);
        assert_eq!(res.body(), b"An internal error occurred.");
    }
}
