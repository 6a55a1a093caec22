use std::sync::Arc;

use async_trait::async_trait;

use techshop_core::render::ReplyRenderer;
use techshop_db::StoreRepository;

use crate::dispatcher::Dispatcher;
use crate::error::ActionError;
use crate::events::Event;
use crate::registry::{Action, ActionContext};
use crate::tracker::Tracker;

pub struct StoreInfo {
    store: Arc<dyn StoreRepository>,
    renderer: Arc<ReplyRenderer>,
}

impl StoreInfo {
    pub const NAME: &'static str = "action_provide_store_info";

    pub fn new(store: Arc<dyn StoreRepository>, renderer: Arc<ReplyRenderer>) -> Self {
        Self { store, renderer }
    }
}

#[async_trait]
impl Action for StoreInfo {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        _context: &ActionContext,
        dispatcher: &mut Dispatcher,
        _tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let branches = self.store.list_branches().await?;
        dispatcher.utter(self.renderer.render_branches(&branches)?);
        Ok(Vec::new())
    }
}

pub struct WarrantyInfo {
    store: Arc<dyn StoreRepository>,
    renderer: Arc<ReplyRenderer>,
}

impl WarrantyInfo {
    pub const NAME: &'static str = "action_provide_warranty_info";

    pub fn new(store: Arc<dyn StoreRepository>, renderer: Arc<ReplyRenderer>) -> Self {
        Self { store, renderer }
    }
}

#[async_trait]
impl Action for WarrantyInfo {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        _context: &ActionContext,
        dispatcher: &mut Dispatcher,
        _tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let policies = self.store.list_warranty_policies().await?;
        dispatcher.utter(self.renderer.render_warranties(&policies)?);
        Ok(Vec::new())
    }
}
