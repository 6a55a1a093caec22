use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotMessage {
    pub text: String,
}

/// Collects the bot replies produced during one action run.
#[derive(Debug, Default)]
pub struct Dispatcher {
    messages: Vec<BotMessage>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn utter(&mut self, text: impl Into<String>) {
        self.messages.push(BotMessage { text: text.into() });
    }

    pub fn messages(&self) -> &[BotMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<BotMessage> {
        self.messages
    }
}
