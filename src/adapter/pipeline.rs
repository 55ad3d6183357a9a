//! Request pipeline
//!
//! Fixed stage order per request: negotiation, body acquisition, output
//! serializer resolution and `process_request`, input serializer resolution
//! and `parse_payload`, engine call, `process_response`, finalize. A failure
//! at any stage short-circuits into error translation.

use super::finalize::Finalizer;
use super::messages::{self, Messages};
use super::negotiation::Negotiation;
use super::{
    ContextRequest, ContextResponse, DomainError, Engine, Error, Meta, Payload, RequestMeta,
    Serializer, SerializerEntry, SerializerRegistry, Settings, StatusMap,
};
use crate::http::transport::{RawRequest, RawResponse};
use crate::logger;
use crate::serializers::default_serializers;
use std::sync::Arc;

/// Construction options; everything has a working default
#[derive(Debug, Clone, Default)]
pub struct ListenerOptions {
    /// `None` selects the built-in serializers
    pub serializers: Option<Vec<SerializerEntry>>,
    pub settings: Settings,
    pub status_map: StatusMap,
    pub messages: Messages,
}

/// HTTP front for a request engine
pub struct Listener {
    engine: Arc<dyn Engine>,
    registry: SerializerRegistry,
    finalizer: Finalizer,
}

/// Stage failure; `input` marks failures caused by the request body
struct Failure {
    error: Error,
    input: bool,
}

impl Failure {
    fn input(error: impl Into<Error>) -> Self {
        Self {
            error: error.into(),
            input: true,
        }
    }
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self {
            error,
            input: false,
        }
    }
}

impl From<DomainError> for Failure {
    fn from(error: DomainError) -> Self {
        Error::from(error).into()
    }
}

/// How far a request got before failing
#[derive(Default)]
struct Progress {
    output: Option<Arc<dyn Serializer>>,
    /// Engine metadata once the engine has answered
    engine_meta: Option<Meta>,
}

impl Progress {
    const fn processing(&self) -> bool {
        self.engine_meta.is_some()
    }
}

impl Listener {
    pub fn new(engine: Arc<dyn Engine>, options: ListenerOptions) -> Result<Self, Error> {
        let entries = options.serializers.unwrap_or_else(default_serializers);
        let registry = SerializerRegistry::new(&engine, &entries)?;
        Ok(Self {
            engine,
            registry,
            finalizer: Finalizer::new(options.settings, options.status_map, options.messages),
        })
    }

    pub const fn settings(&self) -> &Settings {
        &self.finalizer.settings
    }

    /// Registered media types in priority order
    pub fn media_types(&self) -> &[String] {
        self.registry.media_types()
    }

    /// Handle one request.
    ///
    /// - `Ok(None)`: the response was ended with a status below 400
    /// - `Ok(Some(response))`: `end_response` is off and the status is
    ///   below 400, including a serializer's redirect on an error path; the
    ///   host writes `response.payload` and ends the transport
    /// - `Err(error)`: the original failure, after the error response has
    ///   been written. Also returned when the final status is 400 or above.
    pub async fn handle(
        &self,
        mut raw_request: RawRequest,
        raw_response: &mut RawResponse,
    ) -> Result<Option<ContextResponse>, Error> {
        let negotiation = Negotiation::resolve(
            &raw_request.headers,
            &self.registry,
            &self.finalizer.settings,
            raw_response,
        );
        let mut progress = Progress::default();

        let failure = match self
            .process(&negotiation, &mut progress, &mut raw_request, raw_response)
            .await
        {
            Ok(response) => {
                return match self
                    .finalizer
                    .finalize(
                        Ok(response),
                        negotiation.encoding,
                        negotiation.language.as_deref(),
                        &raw_request,
                        raw_response,
                    )
                    .await
                {
                    Ok(done) => Ok(done),
                    Err(error) => settle(raw_response, error),
                };
            }
            Err(failure) => failure,
        };

        self.recover(failure, &negotiation, &progress, &raw_request, raw_response)
            .await
    }

    async fn process(
        &self,
        negotiation: &Negotiation,
        progress: &mut Progress,
        raw_request: &mut RawRequest,
        raw_response: &mut RawResponse,
    ) -> Result<ContextResponse, Failure> {
        let language = negotiation.language.as_deref();

        let body = raw_request.take_body().into_bytes().await.map_err(|e| {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Failure::input(Error::other(self.translate(
                messages::INVALID_BODY,
                language,
            )))
        })?;
        let body_length = body.len();

        let request = ContextRequest {
            meta: RequestMeta {
                headers: raw_request.headers.clone(),
                language: negotiation.language.clone(),
                method: raw_request.method.clone(),
                uri: raw_request.uri.clone(),
            },
            payload: (body_length > 0).then(|| Payload::Bytes(body)),
        };

        let output_type = negotiation.output_media_type.as_deref().unwrap_or_default();
        let output = Arc::clone(self.registry.get(output_type).ok_or_else(|| {
            DomainError::not_acceptable(self.not_found_message(output_type, language))
        })?);
        progress.output = Some(Arc::clone(&output));

        let mut request = output
            .process_request(request, raw_request, raw_response)
            .await?;

        if let Some(input_type) = negotiation.input_media_type.as_deref() {
            let input = self.registry.get(input_type).ok_or_else(|| {
                DomainError::unsupported(self.not_found_message(input_type, language))
            })?;
            request.payload = if body_length > 0 {
                Some(
                    input
                        .parse_payload(&request, raw_request, raw_response)
                        .await
                        .map_err(Failure::input)?,
                )
            } else {
                None
            };
        }

        let response = self.engine.request(request).await?;
        progress.engine_meta = Some(response.meta.clone());

        Ok(output
            .process_response(response, raw_request, raw_response)
            .await?)
    }

    /// Translate a stage failure into an error response, then settle
    async fn recover(
        &self,
        failure: Failure,
        negotiation: &Negotiation,
        progress: &Progress,
        raw_request: &RawRequest,
        raw_response: &mut RawResponse,
    ) -> Result<Option<ContextResponse>, Error> {
        let Failure { error, input } = failure;
        let language = negotiation.language.as_deref();

        let exposed = match &error {
            Error::Domain(domain) => domain.clone(),
            _ => {
                let wrapped = if input {
                    DomainError::bad_request(self.translate(messages::INVALID_BODY, language))
                } else {
                    DomainError::generic(self.translate(messages::GENERIC_ERROR, language))
                };
                // A partial engine response only contributes its metadata
                match &progress.engine_meta {
                    Some(meta) => wrapped.with_meta(meta.clone()),
                    None => wrapped,
                }
            }
        };

        let formatted = match &progress.output {
            Some(output) if !progress.processing() => {
                match output
                    .process_response(exposed.into_response(), raw_request, raw_response)
                    .await
                {
                    Ok(response) => Ok(response),
                    Err(format_error) => {
                        logger::log_error(&format!(
                            "Serializer '{}' failed to format error '{error}': {format_error}",
                            output.media_type()
                        ));
                        self.finalizer.last_resort(raw_response, language);
                        return settle(raw_response, error);
                    }
                }
            }
            _ => Err(Error::Domain(exposed)),
        };

        match self
            .finalizer
            .finalize(
                formatted,
                negotiation.encoding,
                language,
                raw_request,
                raw_response,
            )
            .await
        {
            // Left open for the host, which writes the payload itself
            Ok(Some(response)) if !is_failure(raw_response) => return Ok(Some(response)),
            Ok(_) => {}
            Err(_) => self.finalizer.last_resort(raw_response, language),
        }

        settle(raw_response, error)
    }

    fn translate(&self, key: &str, language: Option<&str>) -> String {
        self.finalizer.messages.translate(key, language, &[])
    }

    fn not_found_message(&self, media_type: &str, language: Option<&str>) -> String {
        self.finalizer.messages.translate(
            messages::SERIALIZER_NOT_FOUND,
            language,
            &[("id", media_type)],
        )
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("registry", &self.registry)
            .field("settings", &self.finalizer.settings)
            .finish_non_exhaustive()
    }
}

/// Statuses below 400 count as handled; anything else surfaces the error
fn settle(raw_response: &RawResponse, error: Error) -> Result<Option<ContextResponse>, Error> {
    if is_failure(raw_response) {
        Err(error)
    } else {
        Ok(None)
    }
}

fn is_failure(raw_response: &RawResponse) -> bool {
    !matches!(raw_response.status(), Some(status) if status.as_u16() < 400)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ResponseKind;
    use crate::http::transport::RequestBody;
    use async_trait::async_trait;
    use hyper::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
    use hyper::{HeaderMap, Method, StatusCode, Uri};

    struct Echo;

    #[async_trait]
    impl Engine for Echo {
        async fn request(&self, request: ContextRequest) -> Result<ContextResponse, Error> {
            Ok(ContextResponse {
                kind: ResponseKind::Ok,
                meta: Meta::default(),
                payload: request.payload,
                message: None,
            })
        }
    }

    fn listener() -> Listener {
        Listener::new(Arc::new(Echo), ListenerOptions::default()).unwrap()
    }

    fn request(accept: &'static str, body: &'static str) -> RawRequest {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        RawRequest::new(
            Method::POST,
            Uri::from_static("/"),
            headers,
            RequestBody::from_bytes(body),
        )
    }

    #[test]
    fn test_default_serializers_registered() {
        assert_eq!(
            listener().media_types(),
            [
                "application/json",
                "text/html",
                "multipart/form-data",
                "application/x-www-form-urlencoded",
            ]
        );
    }

    #[tokio::test]
    async fn test_json_echo() {
        let mut res = RawResponse::new();
        let result = listener()
            .handle(request("application/json", r#"{"a":1}"#), &mut res)
            .await;
        assert!(matches!(result, Ok(None)));
        assert_eq!(res.status(), Some(StatusCode::OK));
        assert_eq!(res.body(), br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_unacceptable_output() {
        let mut res = RawResponse::new();
        let result = listener().handle(request("text/csv", "{}"), &mut res).await;
        let error = result.unwrap_err();
        assert_eq!(error.kind(), ResponseKind::NotAcceptable);
        assert_eq!(res.status(), Some(StatusCode::NOT_ACCEPTABLE));
        assert_eq!(
            res.body(),
            b"NotAcceptableError: The serializer for \"text/csv\" does not exist."
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let mut res = RawResponse::new();
        let result = listener()
            .handle(request("application/json", "{nope"), &mut res)
            .await;
        assert!(result.is_err());
        assert_eq!(res.status(), Some(StatusCode::BAD_REQUEST));
        assert!(res.is_ended());
    }
}
