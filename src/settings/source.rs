//! Configuration value lookup.
//!
//! A [`ConfigSource`] answers raw JSON values by key. The typed getters
//! accept the loose shapes stack configuration tends to arrive in: booleans
//! and integers written as strings, and structured values written as JSON
//! text.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{SettingsError, SettingsResult};

fn shape_error(key: &str, expected: &'static str, found: &Value) -> SettingsError {
    SettingsError::ConfigShape {
        key: key.to_string(),
        expected,
        found: found.to_string(),
    }
}

/// Typed lookup of configuration values
pub trait ConfigSource: Send + Sync {
    /// The raw value stored under `key`, if any.
    fn raw(&self, key: &str) -> Option<Value>;

    fn try_string(&self, key: &str) -> SettingsResult<Option<String>> {
        match self.raw(key) {
            Some(Value::String(s)) => Ok(Some(s)),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
            Some(v) => Err(shape_error(key, "string", &v)),
            None => Ok(None),
        }
    }

    fn try_bool(&self, key: &str) -> SettingsResult<Option<bool>> {
        match self.raw(key) {
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(Value::String(s)) => {
                let normalized = s.trim().to_lowercase();
                match normalized.as_str() {
                    "true" | "yes" | "1" | "on" => Ok(Some(true)),
                    "false" | "no" | "0" | "off" => Ok(Some(false)),
                    _ => Err(shape_error(key, "boolean", &Value::String(s))),
                }
            }
            Some(v) => Err(shape_error(key, "boolean", &v)),
            None => Ok(None),
        }
    }

    fn try_u32(&self, key: &str) -> SettingsResult<Option<u32>> {
        match self.raw(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| shape_error(key, "non-negative integer", &Value::Number(n))),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| shape_error(key, "non-negative integer", &Value::String(s))),
            Some(v) => Err(shape_error(key, "non-negative integer", &v)),
            None => Ok(None),
        }
    }

    /// Structured lookup. A string value is parsed as JSON text first.
    fn try_object<T: DeserializeOwned>(&self, key: &str) -> SettingsResult<Option<T>>
    where
        Self: Sized,
    {
        let value = match self.raw(key) {
            Some(Value::String(text)) => serde_json::from_str::<Value>(&text)
                .map_err(|_| shape_error(key, "structured value", &Value::String(text)))?,
            Some(v) => v,
            None => return Ok(None),
        };

        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|_| shape_error(key, std::any::type_name::<T>(), &value))
    }
}

/// Stack configuration values, optionally namespaced by project.
///
/// With a namespace of `network`, the key `vpcCidr` is answered from
/// `vpcCidr` if present, else from `network:vpcCidr`.
#[derive(Debug, Clone, Default)]
pub struct StackValues {
    namespace: Option<String>,
    values: Map<String, Value>,
}

impl StackValues {
    pub fn new(values: Map<String, Value>) -> Self {
        Self {
            namespace: None,
            values,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigSource for StackValues {
    fn raw(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned().or_else(|| {
            self.namespace
                .as_ref()
                .and_then(|ns| self.values.get(&format!("{}:{}", ns, key)).cloned())
        })
    }
}

impl ConfigSource for HashMap<String, Value> {
    fn raw(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl ConfigSource for Map<String, Value> {
    fn raw(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_try_bool_accepts_strings() {
        let values = source(json!({"a": true, "b": "no", "c": "1", "d": "maybe"}));

        assert_eq!(values.try_bool("a").unwrap(), Some(true));
        assert_eq!(values.try_bool("b").unwrap(), Some(false));
        assert_eq!(values.try_bool("c").unwrap(), Some(true));
        assert!(values.try_bool("d").is_err());
        assert_eq!(values.try_bool("missing").unwrap(), None);
    }

    #[test]
    fn test_try_u32() {
        let values = source(json!({"n": 3, "s": "4", "neg": -1, "list": [1]}));

        assert_eq!(values.try_u32("n").unwrap(), Some(3));
        assert_eq!(values.try_u32("s").unwrap(), Some(4));
        assert!(values.try_u32("neg").is_err());
        assert!(values.try_u32("list").is_err());
    }

    #[test]
    fn test_try_object_from_json_text() {
        let values = source(json!({
            "zones": "[\"us-west-2a\", \"us-west-2b\"]",
            "cidrs": ["10.1.0.0/24"],
            "broken": "[not json",
        }));

        let zones: Option<Vec<String>> = values.try_object("zones").unwrap();
        assert_eq!(zones.unwrap(), vec!["us-west-2a", "us-west-2b"]);

        let cidrs: Option<Vec<String>> = values.try_object("cidrs").unwrap();
        assert_eq!(cidrs.unwrap(), vec!["10.1.0.0/24"]);

        let broken: SettingsResult<Option<Vec<String>>> = values.try_object("broken");
        assert!(matches!(broken, Err(SettingsError::ConfigShape { .. })));
    }

    #[test]
    fn test_namespaced_lookup() {
        let mut values = StackValues::new(Map::new()).with_namespace("network");
        values.insert("network:vpcCidr", json!("10.10.0.0/16"));
        values.insert("vpcTenancy", json!("dedicated"));
        values.insert("network:vpcTenancy", json!("default"));

        assert_eq!(values.try_string("vpcCidr").unwrap().as_deref(), Some("10.10.0.0/16"));
        assert_eq!(values.try_string("vpcTenancy").unwrap().as_deref(), Some("dedicated"));
        assert_eq!(values.len(), 3);
    }
}
