//! Adapter error types

use super::{ContextResponse, Meta, Payload, ResponseKind};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error of a known kind, optionally carrying response metadata or payload
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DomainError {
    pub kind: ResponseKind,
    pub message: String,
    pub meta: Option<Meta>,
    pub payload: Option<Payload>,
}

impl DomainError {
    pub fn new(kind: ResponseKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            meta: None,
            payload: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ResponseKind::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ResponseKind::NotFound, message)
    }

    pub fn not_acceptable(message: impl Into<String>) -> Self {
        Self::new(ResponseKind::NotAcceptable, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ResponseKind::Unsupported, message)
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ResponseKind::Error, message)
    }

    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Whether a serializer or the engine already attached response data
    pub const fn is_augmented(&self) -> bool {
        self.meta.is_some() || self.payload.is_some()
    }

    pub fn into_response(self) -> ContextResponse {
        ContextResponse {
            kind: self.kind,
            meta: self.meta.unwrap_or_default(),
            payload: self.payload,
            message: Some(self.message),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Anything outside the known kinds
    #[error("Error: {0}")]
    Other(BoxError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Response has already ended")]
    ResponseEnded,
}

impl Error {
    pub fn other(error: impl Into<BoxError>) -> Self {
        Self::Other(error.into())
    }

    /// Kind used for the status lookup
    pub const fn kind(&self) -> ResponseKind {
        match self {
            Self::Domain(error) => error.kind,
            _ => ResponseKind::Error,
        }
    }

    pub const fn is_augmented(&self) -> bool {
        match self {
            Self::Domain(error) => error.is_augmented(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Other(Box::new(error))
    }
}
