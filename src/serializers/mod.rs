//! Built-in serializers
//!
//! Thin defaults so a listener works out of the box. Hosts register their
//! own formats through [`SerializerEntry`].

mod form;
mod html;
mod json;
mod multipart;

pub use form::FormSerializer;
pub use html::HtmlSerializer;
pub use json::JsonSerializer;
pub use multipart::MultipartSerializer;

use crate::adapter::SerializerEntry;
use serde_json::{Map, Value};
use std::sync::Arc;

/// JSON, HTML, multipart form-data, then url-encoded forms
pub fn default_serializers() -> Vec<SerializerEntry> {
    [
        json::MEDIA_TYPE,
        html::MEDIA_TYPE,
        multipart::MEDIA_TYPE,
        form::MEDIA_TYPE,
    ]
    .into_iter()
    .filter_map(by_media_type)
    .collect()
}

/// Entry for a built-in serializer by media type
pub fn by_media_type(media_type: &str) -> Option<SerializerEntry> {
    match media_type {
        json::MEDIA_TYPE => Some(SerializerEntry::new(|_, settings| {
            Arc::new(JsonSerializer::from_settings(settings))
        })),
        html::MEDIA_TYPE => Some(SerializerEntry::new(|_, _| Arc::new(HtmlSerializer))),
        multipart::MEDIA_TYPE => Some(SerializerEntry::new(|_, _| Arc::new(MultipartSerializer))),
        form::MEDIA_TYPE => Some(SerializerEntry::new(|_, _| Arc::new(FormSerializer))),
        _ => None,
    }
}

/// Insert a form field; a repeated name turns the value into an array
fn insert_field(object: &mut Map<String, Value>, name: String, value: Value) {
    match object.get_mut(&name) {
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            object.insert(name, value);
        }
    }
}

/// Text form of a flat field value
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_by_media_type() {
        assert!(by_media_type("application/json").is_some());
        assert!(by_media_type("text/html").is_some());
        assert!(by_media_type("multipart/form-data").is_some());
        assert!(by_media_type("application/x-www-form-urlencoded").is_some());
        assert!(by_media_type("text/csv").is_none());
        assert_eq!(default_serializers().len(), 4);
    }

    #[test]
    fn test_insert_field_collects_repeats() {
        let mut object = Map::new();
        insert_field(&mut object, "a".to_string(), json!("1"));
        insert_field(&mut object, "a".to_string(), json!("2"));
        insert_field(&mut object, "a".to_string(), json!("3"));
        insert_field(&mut object, "b".to_string(), json!({"x": 1}));
        assert_eq!(Value::Object(object), json!({"a": ["1", "2", "3"], "b": {"x": 1}}));
    }
}
