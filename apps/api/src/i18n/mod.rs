//! Message catalogs for user-facing validation messages.
//!
//! Catalogs are nested JSON documents embedded at compile time and flattened
//! into dotted keys (`personalInfo.email.required`).

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

pub const DEFAULT_LOCALE: &str = "en";

const EMBEDDED: &[(&str, &str)] = &[
    ("en", include_str!("../../messages/en.json")),
    ("de", include_str!("../../messages/de.json")),
];

/// Looks up a human-readable message by dotted key.
/// Unknown keys translate to the key itself.
pub trait Translate: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct MessageCatalog {
    locale: String,
    messages: HashMap<String, String>,
}

impl MessageCatalog {
    pub fn from_json(locale: &str, json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)
            .with_context(|| format!("Message catalog '{locale}' is not valid JSON"))?;
        let mut messages = HashMap::new();
        flatten("", &root, &mut messages);
        Ok(MessageCatalog {
            locale: locale.to_string(),
            messages,
        })
    }

    /// Loads an embedded catalog, falling back to English for unknown locales.
    pub fn for_locale(locale: &str) -> Result<Self> {
        let (name, json) = match EMBEDDED.iter().find(|(name, _)| *name == locale) {
            Some(entry) => *entry,
            None => {
                warn!("No message catalog for locale '{locale}', using '{DEFAULT_LOCALE}'");
                EMBEDDED
                    .iter()
                    .find(|(name, _)| *name == DEFAULT_LOCALE)
                    .copied()
                    .context("Default message catalog missing")?
            }
        };
        Self::from_json(name, json)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Translate for MessageCatalog {
    fn translate(&self, key: &str) -> String {
        self.messages
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        // Catalogs only carry strings; numbers and lists are ignored.
        _ => {}
    }
}
