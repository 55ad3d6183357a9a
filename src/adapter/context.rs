//! Protocol-neutral request/response values
//!
//! These are what the request engine sees: no transport handles, no status
//! codes. Every response carries an explicit [`ResponseKind`] tag which the
//! [`StatusMap`](super::StatusMap) turns into an HTTP status at the very end.

use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Uri};
use std::fmt;

/// Closed set of response and error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    Ok,
    Created,
    Empty,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Method,
    NotAcceptable,
    Conflict,
    Unsupported,
    /// Generic error, also the fallback for anything unrecognised
    Error,
}

impl ResponseKind {
    /// All kinds, successes first
    pub const ALL: [Self; 12] = [
        Self::Ok,
        Self::Created,
        Self::Empty,
        Self::BadRequest,
        Self::Unauthorized,
        Self::Forbidden,
        Self::NotFound,
        Self::Method,
        Self::NotAcceptable,
        Self::Conflict,
        Self::Unsupported,
        Self::Error,
    ];

    pub const fn is_error(self) -> bool {
        !matches!(self, Self::Ok | Self::Created | Self::Empty)
    }

    /// Name used when rendering errors, e.g. `NotAcceptableError`
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Created => "Created",
            Self::Empty => "Empty",
            Self::BadRequest => "BadRequestError",
            Self::Unauthorized => "UnauthorizedError",
            Self::Forbidden => "ForbiddenError",
            Self::NotFound => "NotFoundError",
            Self::Method => "MethodError",
            Self::NotAcceptable => "NotAcceptableError",
            Self::Conflict => "ConflictError",
            Self::Unsupported => "UnsupportedError",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Request or response body in whatever shape the current stage holds it
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw or encoded bytes
    Bytes(Bytes),
    /// Encoded text
    Text(String),
    /// Structured value, decoded from the wire or awaiting encoding
    Value(serde_json::Value),
}

impl Payload {
    /// Empty text, `null`, `false`, zero and `""` count as no payload at all.
    /// Empty bytes do not: they still get a `Content-Length: 0`.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Bytes(_) => false,
            Self::Text(text) => text.is_empty(),
            Self::Value(value) => match value {
                serde_json::Value::Null => true,
                serde_json::Value::Bool(flag) => !flag,
                serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
                serde_json::Value::String(s) => s.is_empty(),
                _ => false,
            },
        }
    }

    /// Byte view of an encoded payload, `None` for structured values
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Text(text) => Some(text.as_bytes()),
            Self::Value(_) => None,
        }
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&'static str> for Payload {
    fn from(text: &'static str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

/// Response metadata flushed to the transport by the finalizer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub headers: HeaderMap,
}

/// Request metadata
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub headers: HeaderMap,
    /// Best language tag from `Accept-Language`
    pub language: Option<String>,
    pub method: Method,
    pub uri: Uri,
}

/// Request handed to the engine
#[derive(Debug, Clone, Default)]
pub struct ContextRequest {
    pub meta: RequestMeta,
    pub payload: Option<Payload>,
}

/// Response produced by the engine or by error translation
#[derive(Debug, Clone, PartialEq)]
pub struct ContextResponse {
    pub kind: ResponseKind,
    pub meta: Meta,
    pub payload: Option<Payload>,
    /// Set for error kinds
    pub message: Option<String>,
}

impl ContextResponse {
    pub fn new(kind: ResponseKind) -> Self {
        Self {
            kind,
            meta: Meta::default(),
            payload: None,
            message: None,
        }
    }

    pub fn ok(payload: impl Into<Payload>) -> Self {
        Self::new(ResponseKind::Ok).with_payload(payload)
    }

    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    pub fn has_payload(&self) -> bool {
        self.payload.as_ref().is_some_and(|p| !p.is_falsy())
    }
}
