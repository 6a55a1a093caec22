use std::sync::Arc;

use async_trait::async_trait;

use techshop_core::render::ReplyRenderer;
use techshop_db::CatalogRepository;

use crate::dispatcher::Dispatcher;
use crate::error::ActionError;
use crate::events::Event;
use crate::registry::{Action, ActionContext};
use crate::tracker::Tracker;

const BRAND_SLOT: &str = "brand";

pub const ASK_BRAND_MESSAGE: &str = "Bạn muốn biết thông tin về nhãn hiệu nào?";

fn unknown_brand(name: &str) -> String {
    format!("Xin lỗi, shop hiện không có nhãn hiệu '{name}'. Bạn có thể xem danh sách các nhãn hiệu khác bằng cách hỏi 'Có những hãng nào?'")
}

pub struct CategoryList {
    catalog: Arc<dyn CatalogRepository>,
    renderer: Arc<ReplyRenderer>,
}

impl CategoryList {
    pub const NAME: &'static str = "action_ask_category_list";

    pub fn new(catalog: Arc<dyn CatalogRepository>, renderer: Arc<ReplyRenderer>) -> Self {
        Self { catalog, renderer }
    }
}

#[async_trait]
impl Action for CategoryList {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        _context: &ActionContext,
        dispatcher: &mut Dispatcher,
        _tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let categories = self.catalog.list_categories().await?;
        dispatcher.utter(self.renderer.render_categories(&categories)?);
        Ok(Vec::new())
    }
}

pub struct BrandList {
    catalog: Arc<dyn CatalogRepository>,
    renderer: Arc<ReplyRenderer>,
}

impl BrandList {
    pub const NAME: &'static str = "action_ask_brand_list";

    pub fn new(catalog: Arc<dyn CatalogRepository>, renderer: Arc<ReplyRenderer>) -> Self {
        Self { catalog, renderer }
    }
}

#[async_trait]
impl Action for BrandList {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        _context: &ActionContext,
        dispatcher: &mut Dispatcher,
        _tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let brands = self.catalog.list_brands().await?;
        dispatcher.utter(self.renderer.render_brands(&brands)?);
        Ok(Vec::new())
    }
}

/// Brand card with its live product count and a few sample products.
pub struct BrandInfo {
    catalog: Arc<dyn CatalogRepository>,
    renderer: Arc<ReplyRenderer>,
}

impl BrandInfo {
    pub const NAME: &'static str = "action_ask_brand_info";

    pub fn new(catalog: Arc<dyn CatalogRepository>, renderer: Arc<ReplyRenderer>) -> Self {
        Self { catalog, renderer }
    }
}

#[async_trait]
impl Action for BrandInfo {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        _context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        // The slot is sticky across turns; a brand named in this message wins.
        let Some(name) =
            tracker.latest_entity_value(BRAND_SLOT).or_else(|| tracker.slot(BRAND_SLOT))
        else {
            dispatcher.utter(ASK_BRAND_MESSAGE);
            return Ok(Vec::new());
        };

        match self.catalog.brand_summary(&name).await? {
            Some(summary) => dispatcher.utter(self.renderer.render_brand_info(&summary)?),
            None => dispatcher.utter(unknown_brand(&name)),
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::{BrandInfo, BrandList, CategoryList, ASK_BRAND_MESSAGE};
    use crate::dispatcher::Dispatcher;
    use crate::registry::{Action, ActionContext};
    use crate::test_support::{demo_catalog, text_renderer};
    use crate::tracker::Tracker;

    async fn reply(action: &dyn Action, tracker: Tracker) -> String {
        let mut dispatcher = Dispatcher::new();
        let events =
            action.run(&ActionContext::default(), &mut dispatcher, &tracker).await.expect("runs");
        assert!(events.is_empty());
        dispatcher.into_messages().into_iter().map(|m| m.text).collect::<Vec<_>>().join("\n")
    }

    #[tokio::test]
    async fn lists_categories_and_brands() {
        let catalog = demo_catalog().await;
        let categories =
            reply(&CategoryList::new(catalog.clone(), text_renderer()), Tracker::default()).await;
        let brands = reply(&BrandList::new(catalog, text_renderer()), Tracker::default()).await;

        assert!(categories.contains("- Điện thoại"));
        assert!(categories.contains("Tổng 2 danh mục"));
        assert!(brands.contains("- Samsung"));
        assert!(brands.contains("Tổng 3 nhãn hiệu"));
    }

    #[tokio::test]
    async fn brand_info_asks_then_answers() {
        let action = BrandInfo::new(demo_catalog().await, text_renderer());

        assert_eq!(reply(&action, Tracker::default()).await, ASK_BRAND_MESSAGE);

        let samsung = reply(&action, Tracker::new("u").with_slot("brand", "samsung")).await;
        assert!(samsung.starts_with("Samsung: 2 sản phẩm"), "{samsung}");

        let unknown = reply(&action, Tracker::new("u").with_slot("brand", "Nokia")).await;
        assert!(unknown.contains("'Nokia'"));
    }

    #[tokio::test]
    async fn brand_named_in_this_message_overrides_the_stale_slot() {
        let action = BrandInfo::new(demo_catalog().await, text_renderer());
        let tracker =
            Tracker::new("u").with_slot("brand", "Samsung").with_entity("brand", "oppo");

        let answer = reply(&action, tracker).await;

        assert!(answer.starts_with("OPPO:"), "{answer}");
    }
}
