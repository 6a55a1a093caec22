use std::sync::Arc;

use async_trait::async_trait;

use techshop_core::domain::product::{Brand, Category, Product};
use techshop_core::render::{ComparedProduct, Comparison, ReplyRenderer};
use techshop_db::CatalogRepository;

use crate::dispatcher::Dispatcher;
use crate::error::ActionError;
use crate::events::Event;
use crate::registry::{Action, ActionContext};
use crate::tracker::Tracker;

const FIRST_SLOT: &str = "product_1";
const SECOND_SLOT: &str = "product_2";

pub const ASK_TWO_PRODUCTS_MESSAGE: &str =
    "Vui lòng cung cấp tên của hai sản phẩm để so sánh. Ví dụ: iPhone 16 và Galaxy S24";

fn not_found(name: &str) -> String {
    format!("Không tìm thấy thông tin của sản phẩm '{name}'")
}

struct Side {
    product: Product,
    price: Option<i64>,
}

/// Side-by-side table of two products. Always clears the conversation's
/// slots once both names were given.
pub struct CompareProducts {
    catalog: Arc<dyn CatalogRepository>,
    renderer: Arc<ReplyRenderer>,
}

impl CompareProducts {
    pub const NAME: &'static str = "action_compare_products";

    pub fn new(catalog: Arc<dyn CatalogRepository>, renderer: Arc<ReplyRenderer>) -> Self {
        Self { catalog, renderer }
    }

    async fn side(&self, name: &str) -> Result<Option<Side>, ActionError> {
        let Some(product) = self.catalog.find_product_by_name(name).await? else {
            return Ok(None);
        };
        let price = self
            .catalog
            .variants_for_product(&product.id)
            .await?
            .first()
            .map(|variant| variant.price);
        Ok(Some(Side { product, price }))
    }
}

fn compared<'a>(side: &'a Side, categories: &'a [Category], brands: &'a [Brand]) -> ComparedProduct<'a> {
    let product = &side.product;
    ComparedProduct {
        product,
        category: product
            .category_id
            .as_ref()
            .and_then(|id| categories.iter().find(|category| &category.id == id)),
        brand: product
            .brand_id
            .as_ref()
            .and_then(|id| brands.iter().find(|brand| &brand.id == id))
            .map(|brand| brand.name.as_str()),
        price: side.price,
    }
}

#[async_trait]
impl Action for CompareProducts {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        _context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let (Some(first), Some(second)) = (tracker.slot(FIRST_SLOT), tracker.slot(SECOND_SLOT))
        else {
            dispatcher.utter(ASK_TWO_PRODUCTS_MESSAGE);
            return Ok(Vec::new());
        };

        let Some(left) = self.side(&first).await? else {
            dispatcher.utter(not_found(&first));
            return Ok(vec![Event::AllSlotsReset]);
        };
        let Some(right) = self.side(&second).await? else {
            dispatcher.utter(not_found(&second));
            return Ok(vec![Event::AllSlotsReset]);
        };

        let categories = self.catalog.list_categories().await?;
        let brands = self.catalog.list_brands().await?;
        let comparison = Comparison::build(
            compared(&left, &categories, &brands),
            compared(&right, &categories, &brands),
        );
        dispatcher.utter(self.renderer.render_comparison(&comparison)?);
        Ok(vec![Event::AllSlotsReset])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{demo_catalog, text_renderer};

    async fn run(tracker: Tracker) -> (Vec<Event>, Vec<String>) {
        let action = CompareProducts::new(demo_catalog().await, text_renderer());
        let mut dispatcher = Dispatcher::new();
        let events =
            action.run(&ActionContext::default(), &mut dispatcher, &tracker).await.expect("runs");
        (events, dispatcher.into_messages().into_iter().map(|m| m.text).collect())
    }

    #[tokio::test]
    async fn same_category_products_are_compared_in_detail() {
        let (events, messages) = run(
            Tracker::new("u").with_slot("product_1", "iPhone 15").with_slot("product_2", "Galaxy A55"),
        )
        .await;

        let table = &messages[0];
        assert!(table.starts_with("So sánh chi tiết - Điện thoại\niPhone 15 vs Galaxy A55"), "{table}");
        assert!(table.contains("- Giá bán: 19.990.000 VNĐ | 9.990.000 VNĐ"), "{table}");
        assert!(table.contains("- Thương hiệu: Apple | Samsung"), "{table}");
        assert!(table.contains("- Battery Capacity: 3349 mAh | 5000 mAh"), "{table}");
        assert_eq!(events, vec![Event::AllSlotsReset]);
    }

    #[tokio::test]
    async fn needs_both_names_and_resets_on_unknown_product() {
        let (events, messages) = run(Tracker::new("u").with_slot("product_1", "iPhone 15")).await;
        assert_eq!(messages, vec![ASK_TWO_PRODUCTS_MESSAGE]);
        assert!(events.is_empty());

        let (events, messages) = run(
            Tracker::new("u").with_slot("product_1", "iPhone 15").with_slot("product_2", "Pixel 9"),
        )
        .await;
        assert_eq!(messages, vec!["Không tìm thấy thông tin của sản phẩm 'Pixel 9'"]);
        assert_eq!(events, vec![Event::AllSlotsReset]);
    }
}
