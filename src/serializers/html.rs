//! `text/html`
//!
//! Meant for browsers poking at the API. Structured values render as nested
//! definition lists, errors as a heading plus message. Request bodies are
//! taken as UTF-8 text.

use crate::adapter::{ContextRequest, ContextResponse, Error, Payload, Serializer};
use crate::http::transport::{RawRequest, RawResponse};
use async_trait::async_trait;
use serde_json::Value;

pub const MEDIA_TYPE: &str = "text/html";

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSerializer;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn render(value: &Value, out: &mut String) {
    match value {
        Value::Object(object) => {
            out.push_str("<dl>");
            for (key, value) in object {
                out.push_str(&format!("<dt>{}</dt><dd>", escape(key)));
                render(value, out);
                out.push_str("</dd>");
            }
            out.push_str("</dl>");
        }
        Value::Array(values) => {
            out.push_str("<ol>");
            for value in values {
                out.push_str("<li>");
                render(value, out);
                out.push_str("</li>");
            }
            out.push_str("</ol>");
        }
        Value::String(s) => out.push_str(&escape(s)),
        Value::Null => {}
        other => out.push_str(&other.to_string()),
    }
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head>\
         <body>{body}</body></html>\n",
        escape(title)
    )
}

#[async_trait]
impl Serializer for HtmlSerializer {
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
        let text = std::str::from_utf8(bytes).map_err(Error::other)?;
        Ok(Payload::Text(text.to_string()))
    }

    async fn process_response(
        &self,
        mut response: ContextResponse,
        raw_request: &RawRequest,
        _raw_response: &mut RawResponse,
    ) -> Result<ContextResponse, Error> {
        if response.kind.is_error() && response.payload.is_none() {
            let name = response.kind.name();
            let message = response.message.as_deref().unwrap_or_default();
            let body = format!("<h1>{name}</h1><p>{}</p>", escape(message));
            response.payload = Some(Payload::Text(document(name, &body)));
        }

        if let Some(payload @ Payload::Value(value)) = &response.payload {
            if !payload.is_falsy() {
                let mut body = String::new();
                render(value, &mut body);
                let title = raw_request.uri.path().to_string();
                response.payload = Some(Payload::Text(document(&title, &body)));
            }
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{DomainError, ResponseKind};
    use crate::http::transport::RequestBody;
    use hyper::body::Bytes;
    use hyper::{HeaderMap, Method, Uri};
    use serde_json::json;

    fn raw() -> RawRequest {
        RawRequest::new(
            Method::GET,
            Uri::from_static("/notes/7"),
            HeaderMap::new(),
            RequestBody::Empty,
        )
    }

    fn text(response: &ContextResponse) -> &str {
        match &response.payload {
            Some(Payload::Text(text)) => text,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_render_nested() {
        let mut out = String::new();
        render(&json!({"done": false, "tags": ["a", 2], "title": "<b>"}), &mut out);
        assert_eq!(
            out,
            "<dl><dt>done</dt><dd>false</dd><dt>tags</dt><dd><ol><li>a</li><li>2</li></ol></dd>\
             <dt>title</dt><dd>&lt;b&gt;</dd></dl>"
        );
    }

    #[tokio::test]
    async fn test_value_becomes_document() {
        let response = HtmlSerializer
            .process_response(
                ContextResponse::ok(json!({"id": 7})),
                &raw(),
                &mut RawResponse::new(),
            )
            .await
            .unwrap();
        let html = text(&response);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>/notes/7</title>"));
        assert!(html.contains("<dt>id</dt><dd>7</dd>"));
    }

    #[tokio::test]
    async fn test_error_document() {
        let error = DomainError::new(ResponseKind::Forbidden, "no <access>").into_response();
        let response = HtmlSerializer
            .process_response(error, &raw(), &mut RawResponse::new())
            .await
            .unwrap();
        let html = text(&response);
        assert!(html.contains("<title>ForbiddenError</title>"));
        assert!(html.contains("<h1>ForbiddenError</h1><p>no &lt;access&gt;</p>"));
    }

    #[tokio::test]
    async fn test_parse_text_body() {
        let request = ContextRequest {
            payload: Some(Payload::Bytes(Bytes::from_static(b"<p>hi</p>"))),
            ..ContextRequest::default()
        };
        let payload = HtmlSerializer
            .parse_payload(&request, &raw(), &mut RawResponse::new())
            .await
            .unwrap();
        assert_eq!(payload, Payload::from("<p>hi</p>"));

        let request = ContextRequest {
            payload: Some(Payload::Bytes(Bytes::from_static(&[0xff, 0xfe]))),
            ..ContextRequest::default()
        };
        let result = HtmlSerializer
            .parse_payload(&request, &raw(), &mut RawResponse::new())
            .await;
        assert!(result.is_err());
    }
}
