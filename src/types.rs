use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A site grouping devices under one customer, as returned by the locations endpoint
///
/// Only `customer_id` is required. `id` and `customer_id` are normalised to
/// strings whether the service sent them as strings or numbers; every other
/// field is kept verbatim in `extra`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Location {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
    #[serde(deserialize_with = "deserialize_id")]
    pub customer_id: String,
    /// Raw device payloads; each one becomes a `Device`. Absent when the
    /// service omitted the list.
    #[serde(default)]
    pub devices: Option<Vec<Value>>,
    /// Fields the client does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Location {
    pub fn name(&self) -> Option<&str> {
        self.extra.get("name").and_then(Value::as_str)
    }
}

/// The service is not consistent about identifiers: accept strings and numbers alike.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value).ok_or_else(|| {
        serde::de::Error::custom(format!("expected a string or number identifier, got {}", value))
    })
}

pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => id_from_value(&value).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a string or number identifier, got {}", value))
        }),
    }
}

pub(crate) fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_parsing() {
        let location: Location = serde_json::from_value(json!({
            "id": 42,
            "customer_id": "C-1",
            "name": "Cabin",
            "devices": [{"id": 1061}]
        }))
        .unwrap();

        assert_eq!(location.id.as_deref(), Some("42"));
        assert_eq!(location.customer_id, "C-1");
        assert_eq!(location.name(), Some("Cabin"));
        assert_eq!(location.devices.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_numeric_identifiers_become_strings() {
        let location: Location = serde_json::from_value(json!({
            "id": 9,
            "customer_id": 7,
            "timezone": "America/Denver"
        }))
        .unwrap();

        assert_eq!(location.id.as_deref(), Some("9"));
        assert_eq!(location.customer_id, "7");
        assert_eq!(location.extra.get("timezone"), Some(&json!("America/Denver")));
    }

    #[test]
    fn test_location_only_needs_customer_id() {
        let location: Location = serde_json::from_value(json!({"customer_id": "A"})).unwrap();
        assert_eq!(location.customer_id, "A");
        assert!(location.id.is_none());
        assert!(location.devices.is_none());

        let location: Location =
            serde_json::from_value(json!({"id": null, "customer_id": "A"})).unwrap();
        assert!(location.id.is_none());

        assert!(serde_json::from_value::<Location>(json!({"id": 1, "devices": []})).is_err());
    }

    #[test]
    fn test_non_scalar_identifier_is_rejected() {
        let result = serde_json::from_value::<Location>(json!({
            "id": {"nested": true},
            "customer_id": 7,
            "devices": []
        }));
        assert!(result.is_err());
    }
}
