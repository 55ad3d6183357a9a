//! `multipart/form-data`
//!
//! Text fields parse like url-encoded ones, repeated names included. A file
//! field becomes `{"filename", "content_type", "data"}` with base64 `data`,
//! and an object of that shape encodes back into a file part.

use super::{insert_field, scalar};
use crate::adapter::{ContextRequest, ContextResponse, Error, Payload, Serializer};
use crate::http::transport::{RawRequest, RawResponse};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::Crc;
use futures_util::stream;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use serde_json::{json, Map, Value};
use std::convert::Infallible;

pub const MEDIA_TYPE: &str = "multipart/form-data";

#[derive(Debug, Clone, Copy, Default)]
pub struct MultipartSerializer;

async fn parse(content_type: &str, body: Bytes) -> Result<Value, Error> {
    let boundary = multer::parse_boundary(content_type).map_err(Error::other)?;
    let chunks = stream::once(async move { Ok::<_, Infallible>(body) });
    let mut multipart = multer::Multipart::new(chunks, boundary);

    let mut object = Map::new();
    while let Some(field) = multipart.next_field().await.map_err(Error::other)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(ToString::to_string);
                let data = field.bytes().await.map_err(Error::other)?;
                json!({
                    "filename": filename,
                    "content_type": content_type,
                    "data": STANDARD.encode(&data),
                })
            }
            None => Value::String(field.text().await.map_err(Error::other)?),
        };
        insert_field(&mut object, name, value);
    }
    Ok(Value::Object(object))
}

struct Part {
    name: String,
    /// File name and content type
    file: Option<(String, String)>,
    data: Vec<u8>,
}

impl Part {
    fn from_value(name: &str, value: &Value) -> Result<Self, Error> {
        let Value::Object(object) = value else {
            return Ok(Self {
                name: name.to_string(),
                file: None,
                data: scalar(value).into_bytes(),
            });
        };
        let (Some(Value::String(filename)), Some(Value::String(data))) =
            (object.get("filename"), object.get("data"))
        else {
            return Err(Error::other(format!("multipart field '{name}' is nested")));
        };
        let content_type = object
            .get("content_type")
            .and_then(Value::as_str)
            .unwrap_or("application/octet-stream");
        Ok(Self {
            name: name.to_string(),
            file: Some((filename.clone(), content_type.to_string())),
            data: STANDARD.decode(data).map_err(Error::other)?,
        })
    }
}

fn quoted(text: &str) -> String {
    text.replace('"', "%22").replace(['\r', '\n'], " ")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Derived from the part contents, lengthened until no part contains it
fn boundary_for(parts: &[Part]) -> String {
    let mut crc = Crc::new();
    for part in parts {
        crc.update(&part.data);
    }
    let mut boundary = format!("resource-http-{:08x}", crc.sum());
    while parts.iter().any(|part| contains(&part.data, boundary.as_bytes())) {
        boundary.push('-');
    }
    boundary
}

/// Returns the boundary and the encoded body
fn encode(value: &Value) -> Result<(String, Vec<u8>), Error> {
    let Value::Object(object) = value else {
        return Err(Error::other("multipart payload must be an object"));
    };
    let mut parts = Vec::new();
    for (name, value) in object {
        match value {
            Value::Array(values) => {
                for value in values {
                    parts.push(Part::from_value(name, value)?);
                }
            }
            value => parts.push(Part::from_value(name, value)?),
        }
    }

    let boundary = boundary_for(&parts);
    let mut body = Vec::new();
    for part in &parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        let name = quoted(&part.name);
        body.extend_from_slice(b"Content-Disposition: form-data; ");
        body.extend_from_slice(format!("name=\"{name}\"").as_bytes());
        if let Some((filename, content_type)) = &part.file {
            let filename = quoted(filename);
            body.extend_from_slice(format!("; filename=\"{filename}\"").as_bytes());
            body.extend_from_slice(format!("\r\nContent-Type: {content_type}").as_bytes());
        }
        body.extend_from_slice(b"\r\n\r\n");
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    Ok((boundary, body))
}

#[async_trait]
impl Serializer for MultipartSerializer {
    fn media_type(&self) -> &str {
        MEDIA_TYPE
    }

    async fn parse_payload(
        &self,
        request: &ContextRequest,
        raw_request: &RawRequest,
        _raw_response: &mut RawResponse,
    ) -> Result<Payload, Error> {
        let content_type = raw_request
            .header(CONTENT_TYPE)
            .ok_or_else(|| Error::other("multipart body without a boundary"))?;
        let body = request
            .payload
            .as_ref()
            .and_then(Payload::as_bytes)
            .map(Bytes::copy_from_slice)
            .unwrap_or_default();
        parse(content_type, body).await.map(Payload::Value)
    }

    async fn process_response(
        &self,
        mut response: ContextResponse,
        _raw_request: &RawRequest,
        _raw_response: &mut RawResponse,
    ) -> Result<ContextResponse, Error> {
        if response.kind.is_error() && response.payload.is_none() {
            response.payload = Some(Payload::Value(json!({
                "kind": response.kind.name(),
                "message": response.message.as_deref().unwrap_or_default(),
            })));
        }

        if let Some(payload @ Payload::Value(value)) = &response.payload {
            if !payload.is_falsy() {
                let (boundary, body) = encode(value)?;
                let content_type = format!("{MEDIA_TYPE}; boundary={boundary}");
                response.meta.headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_str(&content_type).map_err(Error::other)?,
                );
                response.payload = Some(Payload::Bytes(Bytes::from(body)));
            }
        }
        Ok(response)
    }
}
