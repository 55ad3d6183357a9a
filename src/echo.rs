// Echo engine
// Demonstration collaborator for the binary: answers with what it was sent

use async_trait::async_trait;
use hyper::Method;
use resource_http::adapter::{
    ContextRequest, ContextResponse, DomainError, Engine, Error, ResponseKind,
};
use serde_json::json;

pub struct EchoEngine;

#[async_trait]
impl Engine for EchoEngine {
    async fn request(&self, request: ContextRequest) -> Result<ContextResponse, Error> {
        let meta = &request.meta;
        match meta.method {
            Method::GET | Method::HEAD => Ok(ContextResponse::ok(json!({
                "method": meta.method.as_str(),
                "path": meta.uri.path(),
                "query": meta.uri.query(),
                "language": meta.language,
            }))),
            Method::POST => Ok(ContextResponse {
                payload: request.payload,
                ..ContextResponse::new(ResponseKind::Created)
            }),
            Method::PUT | Method::PATCH => Ok(match request.payload {
                Some(payload) => ContextResponse::ok(payload),
                None => ContextResponse::new(ResponseKind::Empty),
            }),
            Method::DELETE => Ok(ContextResponse::new(ResponseKind::Empty)),
            _ => Err(DomainError::new(
                ResponseKind::Method,
                format!("Method {} is not supported.", meta.method),
            )
            .into()),
        }
    }
}
