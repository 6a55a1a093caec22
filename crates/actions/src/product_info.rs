//! Questions about one named product: its card, a single spec, the full spec
//! sheet and its price list.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use techshop_core::domain::product::Product;
use techshop_core::domain::specs::{matching_entries, spec_sheet, topic_keywords, variant_attributes, SpecEntry};
use techshop_core::render::{render_price_list, ProductDetail, ReplyRenderer};
use techshop_db::CatalogRepository;

use crate::dispatcher::Dispatcher;
use crate::error::ActionError;
use crate::events::Event;
use crate::registry::{Action, ActionContext};
use crate::tracker::Tracker;

const PRODUCT_SLOT: &str = "product";
const PRODUCT_NAME_SLOT: &str = "product_name";
const SPEC_TYPE_SLOT: &str = "spec_type";

/// Variants consulted when the product itself carries no matching attribute.
const SPEC_VARIANT_SAMPLE: usize = 2;
const UNNAMED_VARIANT: &str = "Bản khác";

pub const ASK_PRODUCT_MESSAGE: &str = "Bạn vui lòng cho tôi biết tên sản phẩm nhé.";
pub const ASK_SPEC_PRODUCT_MESSAGE: &str = "Bạn muốn xem thông số của sản phẩm nào?";
pub const ASK_SHEET_PRODUCT_MESSAGE: &str = "Bạn muốn xem thông số kỹ thuật của sản phẩm nào?";

fn product_not_found(name: &str) -> String {
    format!("Xin lỗi, tôi không tìm thấy thông tin cho sản phẩm {name}.")
}

fn no_price(name: &str) -> String {
    format!("Sản phẩm {name} chưa có thông tin giá.")
}

fn ask_spec_type(product: &str) -> String {
    format!("Bạn muốn xem thông số gì của {product}?")
}

fn spec_not_found(topic: &str, product: &str) -> String {
    format!("Tôi không tìm thấy thông tin về {topic} cho {product}.")
}

fn sheet_empty(product: &str) -> String {
    format!("Hiện chưa có thông số kỹ thuật cho {product}.")
}

async fn brand_name(
    catalog: &dyn CatalogRepository,
    product: &Product,
) -> Result<Option<String>, ActionError> {
    let Some(brand_id) = &product.brand_id else {
        return Ok(None);
    };
    let brands = catalog.list_brands().await?;
    Ok(brands.into_iter().find(|brand| &brand.id == brand_id).map(|brand| brand.name))
}

/// Product card: brand, discount, counters, description and every variant.
pub struct ProductInfo {
    catalog: Arc<dyn CatalogRepository>,
    renderer: Arc<ReplyRenderer>,
}

impl ProductInfo {
    pub const NAME: &'static str = "action_provide_product_info";

    pub fn new(catalog: Arc<dyn CatalogRepository>, renderer: Arc<ReplyRenderer>) -> Self {
        Self { catalog, renderer }
    }
}

#[async_trait]
impl Action for ProductInfo {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        _context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let Some(name) = tracker.slot(PRODUCT_SLOT) else {
            dispatcher.utter(ASK_PRODUCT_MESSAGE);
            return Ok(Vec::new());
        };

        let Some(product) = self.catalog.find_product_by_name(&name).await? else {
            dispatcher.utter(product_not_found(&name));
            return Ok(Vec::new());
        };

        let variants = self.catalog.variants_for_product(&product.id).await?;
        if variants.is_empty() {
            dispatcher.utter(no_price(&product.name));
            return Ok(Vec::new());
        }

        let brand = brand_name(self.catalog.as_ref(), &product).await?;
        dispatcher.utter(self.renderer.render_product_info(ProductDetail {
            product: &product,
            brand: brand.as_deref(),
            variants: &variants,
        })?);
        Ok(Vec::new())
    }
}

/// One spec topic ("pin", "màn hình", ...) of one product. Falls back to the
/// first variants' own memory fields when the product has no match.
pub struct ProductSpec {
    catalog: Arc<dyn CatalogRepository>,
    renderer: Arc<ReplyRenderer>,
}

impl ProductSpec {
    pub const NAME: &'static str = "action_provide_product_spec";

    pub fn new(catalog: Arc<dyn CatalogRepository>, renderer: Arc<ReplyRenderer>) -> Self {
        Self { catalog, renderer }
    }
}

#[async_trait]
impl Action for ProductSpec {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let Some(name) = tracker.slot(PRODUCT_NAME_SLOT) else {
            dispatcher.utter(ASK_SPEC_PRODUCT_MESSAGE);
            return Ok(Vec::new());
        };
        let Some(topic) = tracker.slot(SPEC_TYPE_SLOT) else {
            dispatcher.utter(ask_spec_type(&name));
            return Ok(Vec::new());
        };

        let Some(product) = self.catalog.find_product_by_name(&name).await? else {
            dispatcher.utter(format!("Xin lỗi, tôi không tìm thấy sản phẩm {name}."));
            return Ok(Vec::new());
        };

        let keywords = topic_keywords(&topic);
        let mut entries = matching_entries(&product.attributes, &keywords);
        if entries.is_empty() {
            let variants = self.catalog.variants_for_product(&product.id).await?;
            for variant in variants.iter().take(SPEC_VARIANT_SAMPLE) {
                let attributes = variant_attributes(variant);
                let label = variant
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(UNNAMED_VARIANT);
                entries.extend(
                    matching_entries(attributes.iter().map(|(key, value)| (key, value)), &keywords)
                        .into_iter()
                        .map(|entry| SpecEntry { label: label.to_string(), value: entry.value }),
                );
            }
        }

        debug!(
            event_name = "product.spec_lookup",
            correlation_id = %context.correlation_id,
            product_id = %product.id.0,
            topic = %topic,
            matches = entries.len(),
            "spec lookup finished"
        );

        if entries.is_empty() {
            dispatcher.utter(spec_not_found(&topic, &product.name));
        } else {
            dispatcher.utter(self.renderer.render_spec_answer(&topic, &product.name, &entries));
        }
        Ok(vec![Event::slot_set(SPEC_TYPE_SLOT, topic)])
    }
}

/// Every attribute of a product, grouped into the fixed spec sheet sections.
pub struct TechnicalSpecs {
    catalog: Arc<dyn CatalogRepository>,
    renderer: Arc<ReplyRenderer>,
}

impl TechnicalSpecs {
    pub const NAME: &'static str = "action_provide_product_technical_specs";

    pub fn new(catalog: Arc<dyn CatalogRepository>, renderer: Arc<ReplyRenderer>) -> Self {
        Self { catalog, renderer }
    }
}

#[async_trait]
impl Action for TechnicalSpecs {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        _context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let Some(name) = tracker.slot(PRODUCT_NAME_SLOT) else {
            dispatcher.utter(ASK_SHEET_PRODUCT_MESSAGE);
            return Ok(Vec::new());
        };

        let Some(product) = self.catalog.find_product_by_name(&name).await? else {
            dispatcher.utter(format!("Xin lỗi, tôi không tìm thấy sản phẩm {name}."));
            return Ok(Vec::new());
        };

        let groups = spec_sheet(&product.attributes);
        if groups.is_empty() {
            dispatcher.utter(sheet_empty(&product.name));
        } else {
            dispatcher.utter(self.renderer.render_spec_sheet(&product.name, &groups)?);
        }
        Ok(Vec::new())
    }
}

pub struct ProvidePrice {
    catalog: Arc<dyn CatalogRepository>,
}

impl ProvidePrice {
    pub const NAME: &'static str = "action_provide_price";

    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Action for ProvidePrice {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        _context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let Some(name) = tracker.slot(PRODUCT_SLOT) else {
            dispatcher.utter(ASK_PRODUCT_MESSAGE);
            return Ok(Vec::new());
        };

        let Some(product) = self.catalog.find_product_by_name(&name).await? else {
            dispatcher.utter(product_not_found(&name));
            return Ok(Vec::new());
        };

        let variants = self.catalog.variants_for_product(&product.id).await?;
        if variants.is_empty() {
            dispatcher.utter(no_price(&product.name));
        } else {
            dispatcher.utter(render_price_list(&product, &variants));
        }
        Ok(Vec::new())
    }
}
