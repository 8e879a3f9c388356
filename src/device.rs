use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::types::id_from_value;

/// One physical water heater known to the session
///
/// The identifier is fixed at construction; everything else is the latest
/// payload the service returned and is replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    device_id: String,
    info: Map<String, Value>,
    last_updated: DateTime<Utc>,
}

impl Device {
    /// Create a device from a raw payload. The payload must be an object with an `id`.
    pub fn from_payload(payload: Value) -> Result<Self> {
        let info = into_object(payload)?;
        let device_id = info
            .get("id")
            .and_then(id_from_value)
            .ok_or(Error::MissingField("id"))?;

        Ok(Device {
            device_id,
            info,
            last_updated: Utc::now(),
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn info(&self) -> &Map<String, Value> {
        &self.info
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.info.get(name)
    }

    pub fn name(&self) -> Option<&str> {
        self.field("name").and_then(Value::as_str)
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Replace the known state with a fresh payload. The identifier is kept as-is.
    pub fn update_device_info(&mut self, payload: Value) -> Result<()> {
        self.info = into_object(payload)?;
        self.last_updated = Utc::now();
        Ok(())
    }
}

fn into_object(payload: Value) -> Result<Map<String, Value>> {
    match payload {
        Value::Object(map) => Ok(map),
        _ => Err(Error::MissingField("id")),
    }
}
