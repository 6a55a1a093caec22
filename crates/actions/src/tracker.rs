use std::collections::BTreeMap;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Conversation state sent by the dialogue engine with every action call.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Tracker {
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub slots: BTreeMap<String, Value>,
    #[serde(default)]
    pub latest_message: LatestMessage,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LatestMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub metadata: MessageMetadata,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Entity {
    pub entity: String,
    #[serde(default)]
    pub value: Value,
}

/// Channel metadata. The web widget forwards the shopper's session token here.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, rename = "accessToken", deserialize_with = "secret_token")]
    pub access_token: Option<SecretString>,
}

fn secret_token<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .map(SecretString::from))
}

impl Tracker {
    pub fn new(sender_id: impl Into<String>) -> Self {
        Self { sender_id: sender_id.into(), ..Self::default() }
    }

    pub fn with_slot(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.slots.insert(name.to_string(), value.into());
        self
    }

    pub fn with_entity(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.latest_message.entities.push(Entity { entity: name.to_string(), value: value.into() });
        self
    }

    pub fn with_access_token(mut self, token: &str) -> Self {
        self.latest_message.metadata.access_token = Some(SecretString::from(token.to_string()));
        self
    }

    /// Slot value as text. Blank strings and nulls read as unset; numbers are
    /// accepted because the NLU fills `quantity` and prices either way.
    pub fn slot(&self, name: &str) -> Option<String> {
        match self.slots.get(name)? {
            Value::String(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    /// Value of the first `name` entity extracted from the current message.
    /// Unlike slots, entities never carry over from earlier turns.
    pub fn latest_entity_value(&self, name: &str) -> Option<String> {
        self.latest_message
            .entities
            .iter()
            .filter(|entity| entity.entity == name)
            .find_map(|entity| match &entity.value {
                Value::String(text) => {
                    let text = text.trim();
                    (!text.is_empty()).then(|| text.to_string())
                }
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
    }

    pub fn access_token(&self) -> Option<&SecretString> {
        self.latest_message.metadata.access_token.as_ref()
    }

    pub fn has_sender(&self) -> bool {
        !self.sender_id.trim().is_empty()
    }
}
