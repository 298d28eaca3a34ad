use crate::error::MdlogError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved key carrying the caller's own timestamp.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// An arbitrary JSON object submitted by a caller. Key order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRecord(Map<String, Value>);

impl LogRecord {
    /// Parse a request body. An empty body is an empty record; anything that
    /// is not a JSON object is rejected.
    pub fn from_slice(body: &[u8]) -> Result<Self, MdlogError> {
        if body.is_empty() {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(other) => Err(MdlogError::Parse(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
            Err(e) => Err(MdlogError::Parse(e.to_string())),
        }
    }

    pub fn timestamp(&self) -> Option<&Value> {
        self.0.get(TIMESTAMP_KEY)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Pretty-printed JSON with 2-space indentation.
    pub fn to_pretty_json(&self) -> Result<String, MdlogError> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }
}

impl From<Map<String, Value>> for LogRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
