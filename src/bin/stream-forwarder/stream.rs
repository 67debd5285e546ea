//! DynamoDB stream trigger payload, reduced to what we forward.
//!
//! Attribute values keep their DynamoDB type descriptors (`{"S": "..."}`),
//! so only string attributes are read and everything else is ignored.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ForwardError;

#[derive(Deserialize, Debug, Default)]
pub struct StreamEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<ChangeRecord>,
}

#[derive(Deserialize, Debug)]
pub struct ChangeRecord {
    #[serde(rename = "eventID", default)]
    pub event_id: Option<String>,
    #[serde(rename = "eventName", default)]
    pub event_name: EventName,
    #[serde(default)]
    pub dynamodb: StreamRecord,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "PascalCase")]
pub struct StreamRecord {
    #[serde(default)]
    pub keys: Item,
    pub new_image: Option<Item>,
}

pub type Item = HashMap<String, AttributeValue>;

#[derive(Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(transparent)]
pub struct AttributeValue(Map<String, Value>);

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        self.0.get("S").and_then(Value::as_str)
    }
}

#[derive(Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(from = "String")]
pub enum EventName {
    Insert,
    Modify,
    Remove,
    Other(String),
}

impl Default for EventName {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        match name.as_str() {
            "INSERT" => Self::Insert,
            "MODIFY" => Self::Modify,
            "REMOVE" => Self::Remove,
            _ => Self::Other(name),
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => f.write_str("INSERT"),
            Self::Modify => f.write_str("MODIFY"),
            Self::Remove => f.write_str("REMOVE"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Variables of the PublishMessage mutation.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct Message {
    pub id: String,
    pub body: String,
}

impl ChangeRecord {
    pub fn is_insert(&self) -> bool {
        self.event_name == EventName::Insert
    }

    /// Extracts `Keys.id.S` and `NewImage.body.S`. `index` is the record's
    /// position in the batch and only feeds the error.
    pub fn message(&self, index: usize) -> Result<Message, ForwardError> {
        let malformed = |attribute| ForwardError::MalformedRecord {
            index,
            event_id: self.event_id.clone(),
            attribute,
        };

        let id = self
            .dynamodb
            .keys
            .get("id")
            .and_then(AttributeValue::as_s)
            .ok_or_else(|| malformed("Keys.id.S"))?;

        let body = self
            .dynamodb
            .new_image
            .as_ref()
            .and_then(|image| image.get("body"))
            .and_then(AttributeValue::as_s)
            .ok_or_else(|| malformed("NewImage.body.S"))?;

        Ok(Message {
            id: id.to_string(),
            body: body.to_string(),
        })
    }
}

/// Insert records of a batch with their position, in delivery order.
pub fn insertions(records: &[ChangeRecord]) -> impl Iterator<Item = (usize, &ChangeRecord)> {
    records.iter().enumerate().filter(|(_, record)| record.is_insert())
}
