use serde_json::{Map, Value};

use crate::RestError;

/// A parsed response envelope: `{d: {...}}`, `{d: {results: [...]}}` or `{error: {...}}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    payload: Option<Map<String, Value>>,
    error: Option<Value>,
}

impl Envelope {
    /// Parses a raw body. An empty body has no payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON.
    pub fn parse(body: &[u8]) -> Result<Self, RestError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value = serde_json::from_slice(body)?;
        Ok(Self::from_value(value))
    }

    /// Builds an envelope from an already parsed document.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut document) = value else {
            return Self::default();
        };

        let payload = match document.remove("d") {
            Some(Value::Object(payload)) => Some(payload),
            _ => None,
        };
        let error = document
            .remove("error")
            .or_else(|| payload.as_ref().and_then(|payload| payload.get("error").cloned()))
            .filter(|error| !error.is_null());

        Self { payload, error }
    }

    /// The `d` payload.
    pub fn payload(&self) -> Option<&Map<String, Value>> {
        self.payload.as_ref()
    }

    /// The service error, if any.
    pub fn error(&self) -> Option<&Value> {
        self.error.as_ref()
    }

    /// Payload present and no error.
    pub fn exists(&self) -> bool {
        self.payload.is_some() && self.error.is_none()
    }

    /// Whether the payload is a `results` collection.
    pub fn is_collection(&self) -> bool {
        self.results().is_some()
    }

    /// Raw members of a collection payload.
    pub fn results(&self) -> Option<&[Value]> {
        self.payload
            .as_ref()
            .and_then(|payload| payload.get("results"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }
}
