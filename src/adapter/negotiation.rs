//! Per-request content negotiation
//!
//! Resolves output media type, input media type, compression and language
//! from the request headers. Sets `Content-Type` and `Content-Encoding` on
//! the transport response as soon as they are known.

use super::{SerializerRegistry, Settings};
use crate::http::compress::Encoding;
use crate::http::negotiate;
use crate::http::transport::RawResponse;
use crate::logger;
use hyper::header::{
    HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONTENT_ENCODING, CONTENT_TYPE,
};
use hyper::HeaderMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiation {
    pub language: Option<String>,
    /// Registered type, or the client's top preference when nothing
    /// registered is acceptable
    pub output_media_type: Option<String>,
    /// MIME type part of `Content-Type`
    pub input_media_type: Option<String>,
    pub encoding: Option<Encoding>,
}

fn header<'a>(headers: &'a HeaderMap, name: &hyper::header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

impl Negotiation {
    pub fn resolve(
        headers: &HeaderMap,
        registry: &SerializerRegistry,
        settings: &Settings,
        response: &mut RawResponse,
    ) -> Self {
        let language = negotiate::language(header(headers, &ACCEPT_LANGUAGE));

        let accept = header(headers, &ACCEPT);
        let output_media_type = match negotiate::media_type(accept, registry.media_types()) {
            Some(media_type) => {
                match HeaderValue::from_str(media_type) {
                    Ok(value) => response.set_header(CONTENT_TYPE, value),
                    Err(e) => logger::log_warning(&format!(
                        "Media type '{media_type}' is not a valid header value: {e}"
                    )),
                }
                Some(media_type.clone())
            }
            None => negotiate::preferred_media_types(accept).into_iter().next(),
        };

        let input_media_type = header(headers, &CONTENT_TYPE)
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string);

        let encoding = if settings.use_compression {
            negotiate::encoding(header(headers, &ACCEPT_ENCODING), &Encoding::TOKENS)
                .and_then(|token| Encoding::from_token(token))
        } else {
            None
        };
        if let Some(encoding) = encoding {
            response.set_header(CONTENT_ENCODING, encoding.header_value());
        }

        Self {
            language,
            output_media_type,
            input_media_type,
            encoding,
        }
    }
}
