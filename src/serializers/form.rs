//! `application/x-www-form-urlencoded`
//!
//! Repeated keys collect into an array, so `a=1&a=2` parses to
//! `{"a": ["1", "2"]}`.

use super::{insert_field, scalar};
use crate::adapter::{ContextRequest, ContextResponse, Error, Payload, Serializer};
use crate::http::transport::{RawRequest, RawResponse};
use async_trait::async_trait;
use serde_json::{Map, Value};

pub const MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy, Default)]
pub struct FormSerializer;

fn parse(bytes: &[u8]) -> Result<Value, Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes).map_err(Error::other)?;
    let mut object = Map::new();
    for (key, value) in pairs {
        insert_field(&mut object, key, Value::String(value));
    }
    Ok(Value::Object(object))
}

/// Flat objects only; arrays expand into repeated keys
fn encode(value: &Value) -> Result<String, Error> {
    let Value::Object(object) = value else {
        return Err(Error::other("form payload must be an object"));
    };
    let mut pairs = Vec::new();
    for (key, value) in object {
        match value {
            Value::Array(values) => pairs.extend(values.iter().map(|v| (key.as_str(), scalar(v)))),
            Value::Object(_) => {
                return Err(Error::other(format!("form field '{key}' is nested")));
            }
            other => pairs.push((key.as_str(), scalar(other))),
        }
    }
    serde_urlencoded::to_string(pairs).map_err(Error::other)
}

#[async_trait]
impl Serializer for FormSerializer {
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
        parse(bytes).map(Payload::Value)
    }

    async fn process_response(
        &self,
        mut response: ContextResponse,
        _raw_request: &RawRequest,
        _raw_response: &mut RawResponse,
    ) -> Result<ContextResponse, Error> {
        if response.kind.is_error() && response.payload.is_none() {
            let text = serde_urlencoded::to_string([
                ("kind", response.kind.name()),
                ("message", response.message.as_deref().unwrap_or_default()),
            ])
            .map_err(Error::other)?;
            response.payload = Some(Payload::Text(text));
        }

        if let Some(Payload::Value(value)) = &response.payload {
            if !value.is_null() {
                response.payload = Some(Payload::Text(encode(value)?));
            }
        }
        Ok(response)
    }
}
