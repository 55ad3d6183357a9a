//! Serializer and engine contracts

use super::{ContextRequest, ContextResponse, Error, Payload};
use crate::http::transport::{RawRequest, RawResponse};
use async_trait::async_trait;

/// Request engine the adapter sits in front of
#[async_trait]
pub trait Engine: Send + Sync {
    async fn request(&self, request: ContextRequest) -> Result<ContextResponse, Error>;
}

/// Translates between wire bytes and the engine's context values for one
/// media type
#[async_trait]
pub trait Serializer: Send + Sync {
    /// Unique media type, e.g. `application/json`
    fn media_type(&self) -> &str;

    /// Enrich the request before payload parsing. May set response headers.
    async fn process_request(
        &self,
        request: ContextRequest,
        _raw_request: &RawRequest,
        _raw_response: &mut RawResponse,
    ) -> Result<ContextRequest, Error> {
        Ok(request)
    }

    /// Decode the buffered body held in `request.payload`
    async fn parse_payload(
        &self,
        request: &ContextRequest,
        raw_request: &RawRequest,
        raw_response: &mut RawResponse,
    ) -> Result<Payload, Error>;

    /// Encode a response, or a translated error when `response.kind` is an
    /// error kind, into bytes or text for the finalizer
    async fn process_response(
        &self,
        response: ContextResponse,
        raw_request: &RawRequest,
        raw_response: &mut RawResponse,
    ) -> Result<ContextResponse, Error>;
}
