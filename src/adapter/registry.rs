//! Serializer registry
//!
//! Built once from configuration entries; maps media type to instance and
//! keeps registration order for negotiation priority.

use super::{Engine, Error, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a serializer against the engine and optional settings
pub type SerializerFactory =
    Arc<dyn Fn(Arc<dyn Engine>, Option<&serde_json::Value>) -> Arc<dyn Serializer> + Send + Sync>;

/// One configured serializer
#[derive(Clone)]
pub struct SerializerEntry {
    pub factory: SerializerFactory,
    pub settings: Option<serde_json::Value>,
}

impl SerializerEntry {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(Arc<dyn Engine>, Option<&serde_json::Value>) -> Arc<dyn Serializer>
            + Send
            + Sync
            + 'static,
    {
        Self {
            factory: Arc::new(factory),
            settings: None,
        }
    }

    /// Entry that always yields the given instance
    pub fn instance(serializer: Arc<dyn Serializer>) -> Self {
        Self::new(move |_, _| Arc::clone(&serializer))
    }

    #[must_use]
    pub fn with_settings(mut self, settings: serde_json::Value) -> Self {
        self.settings = Some(settings);
        self
    }
}

impl fmt::Debug for SerializerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerEntry")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

pub struct SerializerRegistry {
    serializers: HashMap<String, Arc<dyn Serializer>>,
    media_types: Vec<String>,
}

impl SerializerRegistry {
    /// Instantiate every entry in order. Fails if an instance has no media
    /// type or if nothing was registered.
    pub fn new(engine: &Arc<dyn Engine>, entries: &[SerializerEntry]) -> Result<Self, Error> {
        let mut serializers = HashMap::new();
        let mut media_types = Vec::new();

        for entry in entries {
            let serializer = (entry.factory)(Arc::clone(engine), entry.settings.as_ref());
            let media_type = serializer.media_type().to_string();
            if media_type.is_empty() {
                return Err(Error::Configuration(
                    "serializer is missing a media type".to_string(),
                ));
            }
            if serializers.insert(media_type.clone(), serializer).is_none() {
                media_types.push(media_type);
            }
        }

        if media_types.is_empty() {
            return Err(Error::Configuration(
                "at least one serializer must be defined".to_string(),
            ));
        }

        Ok(Self {
            serializers,
            media_types,
        })
    }

    pub fn get(&self, media_type: &str) -> Option<&Arc<dyn Serializer>> {
        self.serializers.get(media_type)
    }

    /// Media types in priority order
    pub fn media_types(&self) -> &[String] {
        &self.media_types
    }
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("media_types", &self.media_types)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{ContextRequest, ContextResponse, Payload};
    use crate::http::transport::{RawRequest, RawResponse};
    use async_trait::async_trait;

    struct Named(String, u8);

    fn named(media_type: &str, tag: u8) -> Arc<dyn Serializer> {
        Arc::new(Named(media_type.to_string(), tag))
    }

    #[async_trait]
    impl Serializer for Named {
        fn media_type(&self) -> &str {
            &self.0
        }

        async fn parse_payload(
            &self,
            _: &ContextRequest,
            _: &RawRequest,
            _: &mut RawResponse,
        ) -> Result<Payload, Error> {
            Ok(Payload::Text(self.1.to_string()))
        }

        async fn process_response(
            &self,
            response: ContextResponse,
            _: &RawRequest,
            _: &mut RawResponse,
        ) -> Result<ContextResponse, Error> {
            Ok(response)
        }
    }

    struct NoopEngine;

    #[async_trait]
    impl Engine for NoopEngine {
        async fn request(&self, _: ContextRequest) -> Result<ContextResponse, Error> {
            Ok(ContextResponse::new(crate::adapter::ResponseKind::Empty))
        }
    }

    fn engine() -> Arc<dyn Engine> {
        Arc::new(NoopEngine)
    }

    #[test]
    fn test_empty_registry_fails() {
        let result = SerializerRegistry::new(&engine(), &[]);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_missing_media_type_fails() {
        let entries = [SerializerEntry::instance(named("", 0))];
        assert!(matches!(
            SerializerRegistry::new(&engine(), &entries),
            Err(Error::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_order_and_last_wins() {
        let entries = [
            SerializerEntry::instance(named("a/a", 1)),
            SerializerEntry::instance(named("b/b", 2)),
            SerializerEntry::instance(named("a/a", 3)),
        ];
        let registry = SerializerRegistry::new(&engine(), &entries).unwrap();
        assert_eq!(registry.media_types(), ["a/a", "b/b"]);
        assert!(registry.get("c/c").is_none());

        let raw = RawRequest::new(
            hyper::Method::GET,
            hyper::Uri::from_static("/"),
            hyper::HeaderMap::new(),
            crate::http::transport::RequestBody::Empty,
        );
        let payload = registry
            .get("a/a")
            .unwrap()
            .parse_payload(&ContextRequest::default(), &raw, &mut RawResponse::new())
            .await
            .unwrap();
        assert_eq!(payload, Payload::Text("3".to_string()));
    }

    #[test]
    fn test_factory_receives_settings() {
        let entry = SerializerEntry::new(|_, settings| {
            let tag = settings
                .and_then(|s| s.get("tag"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("none/none");
            named(tag, 0)
        })
        .with_settings(serde_json::json!({"tag": "x/y"}));
        let registry = SerializerRegistry::new(&engine(), &[entry]).unwrap();
        assert_eq!(registry.media_types(), ["x/y"]);
    }
}
