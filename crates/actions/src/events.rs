use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tracker mutations an action hands back to the dialogue engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Event {
    #[serde(rename = "slot")]
    SlotSet { name: String, value: Value },
    #[serde(rename = "reset_slots")]
    AllSlotsReset,
    /// Drops the whole conversation, slots and history alike.
    #[serde(rename = "restart")]
    Restarted,
}

impl Event {
    pub fn slot_set(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::SlotSet { name: name.into(), value: value.into() }
    }

    pub fn clear_slot(name: impl Into<String>) -> Self {
        Self::SlotSet { name: name.into(), value: Value::Null }
    }

    pub fn clear_slots<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Self> {
        names.into_iter().map(Self::clear_slot).collect()
    }
}
