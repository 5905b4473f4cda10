//! Schema-typed records returned by the three direct-entry endpoints.
//!
//! Each record doubles as the type contract for the model: its
//! [`ResponseSchema::response_schema`] is sent with the request, and the
//! returned JSON is deserialised straight into the record. Every field is
//! optional, so a response with nothing filled in is a valid record whose
//! fields all serialise as `null`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A record type the model can be asked to produce.
pub trait ResponseSchema: DeserializeOwned + Serialize {
    /// Name used in logs and in [`crate::AnkonaError::SchemaMismatch`].
    const NAME: &'static str;

    /// Gemini `responseSchema` (OpenAPI subset) describing `Self`.
    fn response_schema() -> Value;
}

/// Direction of a khata entry, from the shopkeeper's point of view.
///
/// Serialised as the Bangla word the shopkeeper would write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// "I gave": money or goods handed to the customer.
    #[serde(rename = "দিলাম", alias = "DILAM")]
    Dilam,
    /// "I received": money taken from the customer.
    #[serde(rename = "পেলাম", alias = "PELAM")]
    Pelam,
}

impl EntryType {
    /// The wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Dilam => "দিলাম",
            EntryType::Pelam => "পেলাম",
        }
    }
}

/// One ledger line extracted from free-form text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookkeepingEntry {
    pub customer_name: Option<String>,
    pub amount: Option<i64>,
    pub entry_type: Option<EntryType>,
    pub notes: Option<String>,
}

impl ResponseSchema for BookkeepingEntry {
    const NAME: &'static str = "BookkeepingEntry";

    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "customer_name": { "type": "STRING", "nullable": true },
                "amount": { "type": "INTEGER", "nullable": true },
                "entry_type": {
                    "type": "STRING",
                    "format": "enum",
                    "enum": [EntryType::Dilam.as_str(), EntryType::Pelam.as_str()],
                    "nullable": true
                },
                "notes": { "type": "STRING", "nullable": true }
            },
            "required": ["customer_name", "amount", "entry_type", "notes"],
            "propertyOrdering": ["customer_name", "amount", "entry_type", "notes"]
        })
    }
}

/// The customer picked from a candidate list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSelection {
    pub selected_name: Option<String>,
}

impl ResponseSchema for CustomerSelection {
    const NAME: &'static str = "CustomerSelection";

    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "selected_name": { "type": "STRING", "nullable": true }
            },
            "required": ["selected_name"]
        })
    }
}

/// Reply from the information desk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoDeskReply {
    pub answer: Option<String>,
    pub reference: Option<i64>,
    pub image: Option<String>,
}

impl ResponseSchema for InfoDeskReply {
    const NAME: &'static str = "InfoDeskReply";

    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "answer": { "type": "STRING", "nullable": true },
                "reference": { "type": "INTEGER", "nullable": true },
                "image": { "type": "STRING", "nullable": true }
            },
            "required": ["answer", "reference", "image"],
            "propertyOrdering": ["answer", "reference", "image"]
        })
    }
}
