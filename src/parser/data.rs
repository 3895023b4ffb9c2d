//! Structured request payloads.

use std::fmt;

use serde_json::Value;

/// A request body decoded according to its declared content type.
///
/// Attached to [`HttpRequest::parsed_data`](crate::parser::HttpRequest) by the
/// body-parser middleware. Requests whose body was not decoded keep `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedData {
    /// An `application/json` body.
    Json(Value),
    /// An `application/x-www-form-urlencoded` body, fields in submission order.
    Form(Vec<(String, String)>),
}

impl ParsedData {
    /// Look up a top-level field.
    ///
    /// For JSON this only matches object members; for forms it returns the
    /// first field with the given name.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            ParsedData::Json(value) => value.get(key).cloned(),
            ParsedData::Form(fields) => fields
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| Value::String(value.clone())),
        }
    }

    /// The payload as a JSON value. Form fields become an object; when a name
    /// repeats, the last value wins.
    pub fn to_value(&self) -> Value {
        match self {
            ParsedData::Json(value) => value.clone(),
            ParsedData::Form(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for ParsedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedData::Json(value) => write!(f, "json {value}"),
            ParsedData::Form(fields) => write!(f, "form {fields:?}"),
        }
    }
}
