use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use techshop_core::render::StockReply;
use techshop_db::{CatalogRepository, StoreRepository};

use crate::dispatcher::Dispatcher;
use crate::error::ActionError;
use crate::events::Event;
use crate::registry::{Action, ActionContext};
use crate::tracker::Tracker;

pub const ASK_PRODUCT_MESSAGE: &str = "Bạn muốn kiểm tra tồn kho cho sản phẩm nào ạ?";

fn product_not_found(name: &str) -> String {
    format!("Xin lỗi, tôi không tìm thấy sản phẩm nào có tên là '{name}'.")
}

/// Stock lookup by product name, optionally narrowed to one variant/color
/// line.
pub struct CheckStock {
    catalog: Arc<dyn CatalogRepository>,
    store: Arc<dyn StoreRepository>,
}

impl CheckStock {
    pub const NAME: &'static str = "action_check_stock";

    pub fn new(catalog: Arc<dyn CatalogRepository>, store: Arc<dyn StoreRepository>) -> Self {
        Self { catalog, store }
    }
}

#[async_trait]
impl Action for CheckStock {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let Some(name) = tracker.slot("product") else {
            dispatcher.utter(ASK_PRODUCT_MESSAGE);
            return Ok(Vec::new());
        };

        let Some(product) = self.catalog.find_product_by_name(&name).await? else {
            dispatcher.utter(product_not_found(&name));
            return Ok(Vec::new());
        };

        let inventory = self.store.inventory_for_product(&product.id).await?;
        let variant = tracker.slot("variant_name");
        let reply = StockReply::assess(inventory.as_ref(), variant.as_deref());
        info!(
            event_name = "stock.checked",
            correlation_id = %context.correlation_id,
            product_id = %product.id.0,
            outcome = ?reply,
            "stock lookup completed"
        );

        dispatcher.utter(reply.message(&name));
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::{CheckStock, ASK_PRODUCT_MESSAGE};
    use crate::dispatcher::Dispatcher;
    use crate::registry::{Action, ActionContext};
    use crate::test_support::{demo_catalog, demo_store};
    use crate::tracker::Tracker;

    async fn reply(tracker: Tracker) -> String {
        let action = CheckStock::new(demo_catalog().await, demo_store().await);
        let mut dispatcher = Dispatcher::new();
        action.run(&ActionContext::default(), &mut dispatcher, &tracker).await.expect("runs");
        dispatcher.into_messages().remove(0).text
    }

    #[tokio::test]
    async fn asks_for_product_when_slot_is_empty() {
        assert_eq!(reply(Tracker::default()).await, ASK_PRODUCT_MESSAGE);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let message = reply(Tracker::new("u").with_slot("product", "Nokia 3310")).await;
        assert_eq!(message, "Xin lỗi, tôi không tìm thấy sản phẩm nào có tên là 'Nokia 3310'.");
    }

    #[tokio::test]
    async fn reports_variant_line_and_summary() {
        let line = reply(
            Tracker::new("u").with_slot("product", "iphone 15").with_slot("variant_name", "128gb - hồng"),
        )
        .await;
        assert!(line.contains("'128GB - Hồng' vẫn còn 5 sản phẩm"), "{line}");

        let summary = reply(Tracker::new("u").with_slot("product", "iPhone 15")).await;
        assert!(summary.contains("Tổng cộng còn 5 sản phẩm"), "{summary}");
        assert!(!summary.contains("128GB - Đen"));
    }

    #[tokio::test]
    async fn product_without_inventory_reads_as_sold_out() {
        let message = reply(Tracker::new("u").with_slot("product", "Galaxy A55")).await;
        assert!(message.contains("hết hàng hoặc chưa được nhập kho"), "{message}");
    }
}
