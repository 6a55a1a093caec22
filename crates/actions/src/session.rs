use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use techshop_core::render::ReplyRenderer;

use crate::dispatcher::Dispatcher;
use crate::error::ActionError;
use crate::events::Event;
use crate::registry::{Action, ActionContext};
use crate::tracker::Tracker;

/// Starts the conversation over.
pub struct RestartSlot;

impl RestartSlot {
    pub const NAME: &'static str = "action_restart_slot";
}

#[async_trait]
impl Action for RestartSlot {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        context: &ActionContext,
        _dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        info!(
            event_name = "session.restarted",
            correlation_id = %context.correlation_id,
            sender_id = %tracker.sender_id,
            "conversation restarted"
        );
        Ok(vec![Event::Restarted])
    }
}

/// Points the shopper at the support hotline and mailbox.
pub struct HumanHandoff {
    renderer: Arc<ReplyRenderer>,
}

impl HumanHandoff {
    pub const NAME: &'static str = "action_human_handoff";

    pub fn new(renderer: Arc<ReplyRenderer>) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl Action for HumanHandoff {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        info!(
            event_name = "session.handoff_requested",
            correlation_id = %context.correlation_id,
            sender_id = %tracker.sender_id,
            "shopper asked for a person"
        );
        dispatcher.utter(self.renderer.render_handoff()?);
        Ok(Vec::new())
    }
}
