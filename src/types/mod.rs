//! Type definitions for usagedash

mod account;
mod error;
mod feedback;
mod usage;
mod worksheet;

pub use account::*;
pub use error::*;
pub use feedback::*;
pub use usage::*;
pub use worksheet::*;

/// Raw store document: a JSON object of field name to value
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Decode a raw document into a typed record.
///
/// `what` names the record in the error, e.g. `"search-usage/u1"`.
pub fn decode<T: serde::de::DeserializeOwned>(doc: Document, what: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(doc))
        .map_err(|e| DashError::Parse(format!("{}: {}", what, e)))
}
