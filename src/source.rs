//! Raw provider contributions.
//!
//! A [`SourceRecord`] is one provider's view of one content key, exactly as the
//! provider reported it. Values are kept raw; the normalizer decides what they
//! mean per field.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reelmerge_common::{ContentKey, ProviderId};
use serde::{Deserialize, Serialize};

/// A raw field value as reported by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl RawValue {
    /// `true` for values that carry no information: null, blank text, an
    /// empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
            RawValue::Bool(_) | RawValue::Integer(_) | RawValue::Float(_) => false,
        }
    }

    /// Render the value as text. Lists are joined with `", "`.
    pub fn to_text(&self) -> String {
        match self {
            RawValue::Null => String::new(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Integer(n) => n.to_string(),
            RawValue::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", *f as i64)
            }
            RawValue::Float(f) => f.to_string(),
            RawValue::Text(s) => s.clone(),
            RawValue::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Integer(n)
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        RawValue::Float(f)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(items: Vec<String>) -> Self {
        RawValue::List(items)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Null)
    }
}

/// One provider's raw contribution for a content key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub provider: ProviderId,
    pub content_key: ContentKey,
    #[serde(default)]
    pub fields: BTreeMap<String, RawValue>,
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

impl SourceRecord {
    /// Create an empty record fetched now.
    pub fn new(provider: ProviderId, content_key: impl Into<ContentKey>) -> Self {
        Self {
            provider,
            content_key: content_key.into(),
            fields: BTreeMap::new(),
            fetched_at: Utc::now(),
        }
    }

    /// Builder-style field setter. Empty values are dropped.
    pub fn with_field(mut self, name: &str, value: impl Into<RawValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style fetch timestamp setter.
    pub fn fetched_at(mut self, at: DateTime<Utc>) -> Self {
        self.fetched_at = at;
        self
    }

    /// Set a field, ignoring empty values.
    pub fn set(&mut self, name: &str, value: impl Into<RawValue>) {
        let value = value.into();
        if !value.is_empty() {
            self.fields.insert(name.to_string(), value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
