use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::dispatcher::{BotMessage, Dispatcher};
use crate::error::ActionError;
use crate::events::Event;
use crate::tracker::Tracker;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionContext {
    pub correlation_id: String,
}

impl Default for ActionContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError>;
}

/// What goes back to the dialogue engine for one action call.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ActionResponse {
    pub events: Vec<Event>,
    pub responses: Vec<BotMessage>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no action registered under `{0}`")]
    UnknownAction(String),
}

#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<A>(&mut self, action: A)
    where
        A: Action + 'static,
    {
        self.actions.insert(action.name().to_string(), Arc::new(action));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.actions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs one action for one turn. Action failures become a fixed apology
    /// in the responses; only an unknown name is an error.
    pub async fn run(
        &self,
        name: &str,
        context: &ActionContext,
        tracker: &Tracker,
    ) -> Result<ActionResponse, RegistryError> {
        let action =
            self.actions.get(name).ok_or_else(|| RegistryError::UnknownAction(name.to_string()))?;

        let mut dispatcher = Dispatcher::new();
        let events = match action.run(context, &mut dispatcher, tracker).await {
            Ok(events) => {
                info!(
                    event_name = "action.completed",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    action = name,
                    events = events.len(),
                    "action completed"
                );
                events
            }
            Err(error) => {
                warn!(
                    event_name = "action.failed",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    action = name,
                    error_kind = error.kind(),
                    error = %error,
                    "action failed; answering with apology"
                );
                dispatcher.utter(error.user_message());
                Vec::new()
            }
        };

        Ok(ActionResponse { events, responses: dispatcher.into_messages() })
    }
}
