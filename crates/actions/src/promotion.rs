use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use techshop_core::render::promotions::ALL_PRODUCTS_TITLE;
use techshop_core::render::ReplyRenderer;
use techshop_db::{CatalogRepository, StoreRepository};

use crate::dispatcher::Dispatcher;
use crate::error::ActionError;
use crate::events::Event;
use crate::registry::{Action, ActionContext};
use crate::tracker::Tracker;

const CATEGORY_SLOT: &str = "category";

/// Running promotions, narrowed to one category when the slot names a known
/// one. An unknown category falls back to the storewide list.
pub struct CheckPromotion {
    catalog: Arc<dyn CatalogRepository>,
    store: Arc<dyn StoreRepository>,
    renderer: Arc<ReplyRenderer>,
}

impl CheckPromotion {
    pub const NAME: &'static str = "action_check_promotion";

    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        store: Arc<dyn StoreRepository>,
        renderer: Arc<ReplyRenderer>,
    ) -> Self {
        Self { catalog, store, renderer }
    }
}

#[async_trait]
impl Action for CheckPromotion {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let category = match tracker.slot(CATEGORY_SLOT) {
            Some(name) => {
                let wanted = name.to_lowercase();
                self.catalog
                    .list_categories()
                    .await?
                    .into_iter()
                    .find(|category| category.name.trim().to_lowercase() == wanted)
            }
            None => None,
        };

        let now = Utc::now();
        let promotions: Vec<_> = self
            .store
            .list_promotions()
            .await?
            .into_iter()
            .filter(|promotion| {
                promotion.is_running(now)
                    && promotion.applies_to(category.as_ref().map(|category| &category.id))
            })
            .collect();

        debug!(
            event_name = "promotion.lookup",
            correlation_id = %context.correlation_id,
            category_id = category.as_ref().map(|category| category.id.0.as_str()).unwrap_or("*"),
            running = promotions.len(),
            "promotions filtered"
        );

        let title = category.as_ref().map_or(ALL_PRODUCTS_TITLE, |category| category.name.as_str());
        dispatcher.utter(self.renderer.render_promotions(title, &promotions)?);
        Ok(Vec::new())
    }
}
