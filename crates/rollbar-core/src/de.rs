//! Lenient field deserializers
//!
//! The Rollbar API is loose about scalar types: ids arrive as numbers or
//! numeric strings, person ids may be numbers, and any field may be `null`.
//! These helpers normalize those shapes instead of failing the whole payload.

use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string, number, bool or null and produce a `String` (`null` becomes empty)
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

/// Like [`lenient_string`] but keeps `null` as `None`
pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    })
}

/// Accept an integer, a float, a numeric string or null (`0`)
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| D::Error::custom(format!("integer out of range: {}", n))),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| D::Error::custom(format!("invalid integer {:?}: {}", s, e))),
        other => Err(D::Error::custom(format!("expected integer, got {}", other))),
    }
}

/// Treat `null` as the type's default value
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_string")]
        s: String,
        #[serde(default, deserialize_with = "lenient_i64")]
        n: i64,
        #[serde(default, deserialize_with = "lenient_opt_string")]
        o: Option<String>,
    }

    fn probe(json: &str) -> Probe {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_lenient_string() {
        assert_eq!(probe(r#"{"s": "abc"}"#).s, "abc");
        assert_eq!(probe(r#"{"s": 42}"#).s, "42");
        assert_eq!(probe(r#"{"s": null}"#).s, "");
        assert_eq!(probe(r#"{}"#).s, "");
    }

    #[test]
    fn test_lenient_i64() {
        assert_eq!(probe(r#"{"n": 7}"#).n, 7);
        assert_eq!(probe(r#"{"n": "12345"}"#).n, 12345);
        assert_eq!(probe(r#"{"n": 1.9}"#).n, 1);
        assert_eq!(probe(r#"{"n": null}"#).n, 0);
        assert!(serde_json::from_str::<Probe>(r#"{"n": "abc"}"#).is_err());
    }

    #[test]
    fn test_lenient_opt_string() {
        assert_eq!(probe(r#"{"o": null}"#).o, None);
        assert_eq!(probe(r#"{"o": 5}"#).o.as_deref(), Some("5"));
        assert_eq!(probe(r#"{"o": ""}"#).o.as_deref(), Some(""));
    }
}
