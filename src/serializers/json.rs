//! `application/json`

use crate::adapter::{ContextRequest, ContextResponse, Error, Payload, Serializer};
use crate::http::transport::{RawRequest, RawResponse};
use async_trait::async_trait;
use hyper::body::Bytes;
use serde_json::{json, Value};

pub const MEDIA_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    pub const fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Reads `{"pretty": bool}`
    pub fn from_settings(settings: Option<&Value>) -> Self {
        let pretty = settings
            .and_then(|s| s.get("pretty"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self::new(pretty)
    }

    fn encode(&self, value: &Value) -> Result<Bytes, Error> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        bytes.map(Bytes::from).map_err(Error::other)
    }
}

#[async_trait]
impl Serializer for JsonSerializer {
    fn media_type(&self) -> &str {
        MEDIA_TYPE
    }

    async fn parse_payload(
        &self,
        request: &ContextRequest,
        _raw_request: &RawRequest,
        _raw_response: &mut RawResponse,
    ) -> Result<Payload, Error> {
        let bytes = request
            .payload
            .as_ref()
            .and_then(Payload::as_bytes)
            .unwrap_or_default();
        let value: Value = serde_json::from_slice(bytes).map_err(Error::other)?;
        Ok(Payload::Value(value))
    }

    async fn process_response(
        &self,
        mut response: ContextResponse,
        _raw_request: &RawRequest,
        _raw_response: &mut RawResponse,
    ) -> Result<ContextResponse, Error> {
        if response.kind.is_error() && response.payload.is_none() {
            response.payload = Some(Payload::Value(json!({
                "error": {
                    "kind": response.kind.name(),
                    "message": response.message.as_deref().unwrap_or_default(),
                }
            })));
        }

        if let Some(Payload::Value(value)) = &response.payload {
            if !value.is_null() {
                response.payload = Some(Payload::Bytes(self.encode(value)?));
            }
        }
        Ok(response)
    }
}
