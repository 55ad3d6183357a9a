//! Translated client-facing messages
//!
//! Lookup order: exact language tag, primary subtag (`en-US` -> `en`),
//! then the default language. Templates use `{name}` placeholders.

use std::collections::HashMap;

pub const GENERIC_ERROR: &str = "GenericError";
pub const INVALID_BODY: &str = "InvalidBody";
pub const SERIALIZER_NOT_FOUND: &str = "SerializerNotFound";
pub const INVALID_PAYLOAD_TYPE: &str = "InvalidPayloadType";

const DEFAULT_LANGUAGE: &str = "en";

/// Message catalogs keyed by lowercase language tag
#[derive(Debug, Clone)]
pub struct Messages {
    catalogs: HashMap<String, HashMap<String, String>>,
    default_language: String,
}

impl Messages {
    /// Register or extend a catalog for a language
    #[must_use]
    pub fn with_language<I, K, V>(mut self, language: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let catalog = self
            .catalogs
            .entry(language.to_ascii_lowercase())
            .or_default();
        catalog.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn translate(&self, key: &str, language: Option<&str>, params: &[(&str, &str)]) -> String {
        let template = language
            .and_then(|tag| self.lookup(key, tag))
            .or_else(|| self.lookup(key, &self.default_language))
            .unwrap_or(key);

        params
            .iter()
            .fold(template.to_string(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }

    fn lookup(&self, key: &str, tag: &str) -> Option<&str> {
        let tag = tag.to_ascii_lowercase();
        let primary = tag.split('-').next().unwrap_or(&tag);
        let found = [tag.as_str(), primary]
            .into_iter()
            .find_map(|t| self.catalogs.get(t)?.get(key))
            .map(String::as_str);
        found
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            catalogs: HashMap::new(),
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
        .with_language(
            DEFAULT_LANGUAGE,
            [
                (GENERIC_ERROR, "An internal error occurred."),
                (INVALID_BODY, "The request body is invalid."),
                (SERIALIZER_NOT_FOUND, "The serializer for \"{id}\" does not exist."),
                (INVALID_PAYLOAD_TYPE, "Response payload type is invalid."),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let messages = Messages::default();
        assert_eq!(
            messages.translate(GENERIC_ERROR, None, &[]),
            "An internal error occurred."
        );
        assert_eq!(
            messages.translate(SERIALIZER_NOT_FOUND, None, &[("id", "text/csv")]),
            "The serializer for \"text/csv\" does not exist."
        );
    }

    #[test]
    fn test_language_fallback() {
        let messages =
            Messages::default().with_language("de", [(INVALID_BODY, "Der Inhalt ist ungültig.")]);
        assert_eq!(
            messages.translate(INVALID_BODY, Some("de-AT"), &[]),
            "Der Inhalt ist ungültig."
        );
        // Missing key in `de` falls back to `en`
        assert_eq!(
            messages.translate(GENERIC_ERROR, Some("de"), &[]),
            "An internal error occurred."
        );
        assert_eq!(
            messages.translate(INVALID_BODY, Some("fr"), &[]),
            "The request body is invalid."
        );
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(Messages::default().translate("Nope", None, &[]), "Nope");
    }
}
