//! Module parameters
//!
//! Parameters arrive as `key=value` strings. Values are typed on parse so
//! lookups can reject a malformed setting instead of silently falling back
//! to the default.

use crate::{Error, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Parameter value types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    String(String),
    U64(u64),
}

impl ParamValue {
    /// Infer the narrowest type for a raw string value
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(v) => ParamValue::U64(v),
            Err(_) => ParamValue::String(trimmed.to_string()),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ParamValue::U64(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::String(s) => write!(f, "{}", s),
            ParamValue::U64(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        ParamValue::U64(v)
    }
}

/// Parameters for one module invocation
#[derive(Debug, Clone, Default)]
pub struct ModuleParams {
    params: HashMap<String, ParamValue>,
}

impl ModuleParams {
    /// Create a new empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| Error::invalid_parameter(pair, "expected key=value"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::invalid_parameter(pair, "empty key"));
            }
            params.params.insert(key.to_string(), ParamValue::infer(value));
        }
        Ok(params)
    }

    /// Set a parameter value
    pub fn set<K: Into<String>, V: Into<ParamValue>>(mut self, key: K, value: V) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Get a parameter value
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Get a u64 parameter, `default` when absent
    pub fn u64_or(&self, key: &str, default: u64) -> Result<u64> {
        match self.params.get(key) {
            None => Ok(default),
            Some(v) => v.as_u64().ok_or_else(|| {
                Error::invalid_parameter(key.to_string(), format!("expected an integer, got '{}'", v))
            }),
        }
    }

    /// Get a millisecond duration parameter, `default_ms` when absent
    pub fn duration_ms_or(&self, key: &str, default_ms: u64) -> Result<Duration> {
        self.u64_or(key, default_ms).map(Duration::from_millis)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_types() {
        assert_eq!(ParamValue::infer("250"), ParamValue::U64(250));
        assert_eq!(ParamValue::infer("on"), ParamValue::String("on".into()));
        assert_eq!(ParamValue::infer(" eth0 "), ParamValue::String("eth0".into()));
    }

    #[test]
    fn test_from_pairs() {
        let params = ModuleParams::from_pairs(["flood_ms=100", "capture_ms = 50"]).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(
            params.duration_ms_or("flood_ms", 500).unwrap(),
            Duration::from_millis(100)
        );
        assert_eq!(params.u64_or("capture_ms", 2000).unwrap(), 50);
    }

    #[test]
    fn test_defaults_when_absent() {
        let params = ModuleParams::new();
        assert_eq!(params.u64_or("flood_ms", 500).unwrap(), 500);
        assert_eq!(params.duration_ms_or("capture_ms", 2000).unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_malformed_pair() {
        assert!(ModuleParams::from_pairs(["flood_ms"]).is_err());
        assert!(ModuleParams::from_pairs(["=5"]).is_err());
    }

    #[test]
    fn test_wrong_type_is_error() {
        let params = ModuleParams::new().set("flood_ms", "fast");
        let err = params.u64_or("flood_ms", 500).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }
}
