//! Transport handles seen by the adapter
//!
//! `RawRequest` is what hyper hands us, split into head and body.
//! `RawResponse` is a buffered response sink: status, headers, body bytes and
//! an `ended` flag. The server converts it into a hyper response once the
//! listener returns (see [`super::response::into_hyper`]).

use crate::adapter::{BoxError, Error};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Request, StatusCode, Uri, Version};

/// Request body as exposed by the transport
pub enum RequestBody {
    Empty,
    /// Body already decoded by the host
    Parsed(serde_json::Value),
    /// Raw byte stream
    Stream(BoxBody<Bytes, BoxError>),
}

impl RequestBody {
    /// Wrap any byte body
    pub fn stream<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + Sync + 'static,
        B::Error: Into<BoxError>,
    {
        Self::Stream(body.map_err(Into::<BoxError>::into).boxed())
    }

    /// Single-chunk body
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::stream(Full::new(bytes.into()))
    }

    /// Buffer the whole body. A pre-parsed body is re-encoded as JSON.
    pub async fn into_bytes(self) -> Result<Bytes, BoxError> {
        match self {
            Self::Empty => Ok(Bytes::new()),
            Self::Parsed(value) => Ok(Bytes::from(serde_json::to_vec(&value)?)),
            Self::Stream(mut body) => {
                let mut buffer = Vec::new();
                while let Some(frame) = body.frame().await {
                    if let Ok(data) = frame?.into_data() {
                        buffer.extend_from_slice(&data);
                    }
                }
                Ok(Bytes::from(buffer))
            }
        }
    }
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Parsed(value) => f.debug_tuple("Parsed").field(value).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Incoming request
#[derive(Debug)]
pub struct RawRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    body: RequestBody,
}

impl RawRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: RequestBody) -> Self {
        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers,
            body,
        }
    }

    pub fn from_hyper<B>(req: Request<B>) -> Self
    where
        B: Body<Data = Bytes> + Send + Sync + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body: RequestBody::stream(body),
        }
    }

    /// Header value as a string, ignoring non-visible-ASCII values
    pub fn header(&self, name: impl hyper::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Take the body out; later calls see `Empty`
    pub fn take_body(&mut self) -> RequestBody {
        std::mem::replace(&mut self.body, RequestBody::Empty)
    }
}

/// Buffered response sink
#[derive(Debug, Default)]
pub struct RawResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    ended: bool,
}

impl RawResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until someone sets it
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: impl hyper::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    pub fn remove_header(&mut self, name: &HeaderName) {
        self.headers.remove(name);
    }

    pub fn clear_headers(&mut self) {
        self.headers.clear();
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub const fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn write(&mut self, chunk: &[u8]) -> Result<(), Error> {
        if self.ended {
            return Err(Error::ResponseEnded);
        }
        self.body.extend_from_slice(chunk);
        Ok(())
    }

    pub fn end(&mut self) -> Result<(), Error> {
        if self.ended {
            return Err(Error::ResponseEnded);
        }
        self.ended = true;
        Ok(())
    }

    /// Consume into status, headers and body; unset status becomes 200
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (
            self.status.unwrap_or(StatusCode::OK),
            self.headers,
            Bytes::from(self.body),
        )
    }
}
