//! Worksheet records from the `worksheets` collection

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stored worksheet fields; everything is optional in practice
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub num_rows: Option<u64>,
    #[serde(default)]
    pub custom_research_prompts: BTreeMap<String, Value>,
}

/// A single worksheet owned by a user
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Worksheet {
    pub id: String,
    /// Worksheet name, falling back to the id
    pub name: String,
    pub num_rows: Option<u64>,
    pub custom_research_prompts: BTreeMap<String, Value>,
}

impl Worksheet {
    pub fn from_fields(id: String, fields: WorksheetFields) -> Self {
        let name = fields.name.unwrap_or_else(|| id.clone());
        Self {
            id,
            name,
            num_rows: fields.num_rows,
            custom_research_prompts: fields.custom_research_prompts,
        }
    }
}
