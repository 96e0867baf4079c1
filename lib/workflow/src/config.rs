//! Node parameter schemas and typed configuration values.
//!
//! Every node type declares its parameters as [`ParamSpec`]s. A node's
//! [`NodeConfig`] holds the current value of each parameter and is checked
//! against the declaring type's schema whenever the catalog knows the type.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// The value of a single configuration parameter.
///
/// Form inputs produce text while the user is typing, so number parameters
/// accept numeric text, including numbers that are only partly typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A numeric value.
    Number(f64),
    /// A textual value.
    Text(String),
}

impl ParamValue {
    /// Creates a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the numeric reading of this value, if it has one.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Converts a JSON value received from the backend.
    ///
    /// Returns `None` for `null`. Booleans, arrays and objects are kept as
    /// their JSON text.
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(Self::Text(s.clone())),
            JsonValue::Number(n) => n.as_f64().map(Self::Number),
            other => Some(Self::Text(other.to_string())),
        }
    }

    /// Converts to the JSON value sent to the backend.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Text(s) => JsonValue::String(s.clone()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// The declared kind of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    /// Free text (symbols, expressions, messages).
    Text,
    /// A number.
    Number,
    /// One of a fixed set of options.
    Select { options: Vec<String> },
}

/// Schema of one configuration parameter of a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name, the key in the node's config.
    pub name: String,
    /// Declared kind.
    pub kind: ParamKind,
    /// Value seeded into new nodes, if any.
    pub default: Option<ParamValue>,
    /// Whether the backend requires the parameter.
    pub required: bool,
}

impl ParamSpec {
    /// A text parameter.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Text,
            default: None,
            required: false,
        }
    }

    /// A number parameter.
    #[must_use]
    pub fn number(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Number,
            default: None,
            required: false,
        }
    }

    /// A select parameter with the given options.
    #[must_use]
    pub fn select<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: ParamKind::Select {
                options: options.into_iter().map(Into::into).collect(),
            },
            default: None,
            required: false,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<ParamValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Marks the parameter as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Checks that `value` fits this parameter's kind.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the value does not fit.
    pub fn check(&self, value: &ParamValue) -> Result<(), String> {
        match &self.kind {
            ParamKind::Text => Ok(()),
            ParamKind::Number => match value {
                ParamValue::Number(_) => Ok(()),
                // Empty input is a field the user is still editing
                ParamValue::Text(s) if s.trim().is_empty() => Ok(()),
                ParamValue::Text(s) if is_partial_number(s.trim()) => Ok(()),
                ParamValue::Text(s) => Err(format!("expected a number, got '{s}'")),
            },
            ParamKind::Select { options } => {
                let chosen = value.to_string();
                if options.iter().any(|o| *o == chosen) {
                    Ok(())
                } else {
                    Err(format!(
                        "'{chosen}' is not one of [{}]",
                        options.join(", ")
                    ))
                }
            }
        }
    }
}

/// Whether `s` is a number, or a prefix of one that typing can complete.
///
/// Accepts an optional sign, digits with at most one `.`, and an exponent
/// (`e`, optional sign, digits) once the mantissa has a digit. So `-`, `.`,
/// `-.` and `1e-` pass while `e5` and `1.2.3` do not.
fn is_partial_number(s: &str) -> bool {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], Some(&body[at + 1..])),
        None => (body, None),
    };

    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in mantissa.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }

    match exponent {
        None => true,
        Some(exp) => {
            let digits = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            seen_digit && digits.chars().all(|c| c.is_ascii_digit())
        }
    }
}

/// The configuration of one node: parameter name to current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeConfig(BTreeMap<String, ParamValue>);

impl NodeConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a configuration from the defaults in a parameter schema.
    #[must_use]
    pub fn from_defaults(params: &[ParamSpec]) -> Self {
        Self(
            params
                .iter()
                .filter_map(|p| p.default.clone().map(|d| (p.name.clone(), d)))
                .collect(),
        )
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Replaces a single entry.
    pub fn set(&mut self, key: impl Into<String>, value: ParamValue) {
        self.0.insert(key.into(), value);
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the configuration has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds a configuration from a backend `data` object, dropping nulls.
    #[must_use]
    pub fn from_json_map(data: &serde_json::Map<String, JsonValue>) -> Self {
        Self(
            data.iter()
                .filter_map(|(k, v)| ParamValue::from_json(v).map(|pv| (k.clone(), pv)))
                .collect(),
        )
    }

    /// Converts to the `data` object sent to the backend.
    #[must_use]
    pub fn to_json_map(&self) -> serde_json::Map<String, JsonValue> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for NodeConfig {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
