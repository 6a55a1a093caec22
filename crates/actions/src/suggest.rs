use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use techshop_core::render::ReplyRenderer;
use techshop_core::search::{FilterResolver, PlanError, PlanOptions, SearchPlan, SlotInput};
use techshop_db::CatalogRepository;

use crate::dispatcher::Dispatcher;
use crate::error::ActionError;
use crate::events::Event;
use crate::registry::{Action, ActionContext};
use crate::tracker::Tracker;

pub const ASK_FOR_FILTER_MESSAGE: &str = "Quý khách vui lòng cho biết loại sản phẩm, hãng hoặc mức giá mong muốn để hệ thống có thể đưa ra những gợi ý phù hợp nhất nhé!";

fn category_not_found(name: &str) -> String {
    format!("Xin lỗi, shop hiện không có danh mục '{name}'. Quý khách có thể hỏi 'Có những danh mục nào?' để xem các danh mục hiện có.")
}

fn brand_not_found(name: &str) -> String {
    format!("Xin lỗi, shop hiện không có nhãn hiệu '{name}'. Bạn có thể xem danh sách các nhãn hiệu khác bằng cách hỏi 'Có những hãng nào?'")
}

/// Filter-and-aggregate product search: slots to filter set, filter set to
/// plan, plan to records, records to one reply.
pub struct SuggestProduct {
    catalog: Arc<dyn CatalogRepository>,
    renderer: Arc<ReplyRenderer>,
    resolver: FilterResolver,
    options: PlanOptions,
}

impl SuggestProduct {
    pub const NAME: &'static str = "action_suggest_product";

    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        renderer: Arc<ReplyRenderer>,
        resolver: FilterResolver,
        options: PlanOptions,
    ) -> Self {
        Self { catalog, renderer, resolver, options }
    }

    fn consumed_slots() -> Vec<Event> {
        Event::clear_slots(SlotInput::FILTER_SLOTS.iter().copied())
    }
}

#[async_trait]
impl Action for SuggestProduct {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let input = SlotInput::from_slots(|name| tracker.slot(name));
        let filters = self.resolver.resolve(&input);
        if filters.is_empty() {
            dispatcher.utter(ASK_FOR_FILTER_MESSAGE);
            return Ok(Vec::new());
        }

        let resolution = self.catalog.resolve_names(&filters).await?;
        let plan = match SearchPlan::from_filters(&filters, &resolution, &self.options) {
            Ok(plan) => plan,
            Err(PlanError::InsufficientFilter) => {
                dispatcher.utter(ASK_FOR_FILTER_MESSAGE);
                return Ok(Vec::new());
            }
            Err(PlanError::CategoryNotFound { name }) => {
                info!(
                    event_name = "search.category_not_found",
                    correlation_id = %context.correlation_id,
                    category = %name,
                    "category did not resolve"
                );
                dispatcher.utter(category_not_found(&name));
                return Ok(Self::consumed_slots());
            }
            Err(PlanError::BrandNotFound { name }) => {
                info!(
                    event_name = "search.brand_not_found",
                    correlation_id = %context.correlation_id,
                    brand = %name,
                    "brand did not resolve and nothing else constrains the search"
                );
                dispatcher.utter(brand_not_found(&name));
                return Ok(Self::consumed_slots());
            }
        };

        if let Some(brand) = plan.unresolved_brand() {
            warn!(
                event_name = "search.brand_dropped",
                correlation_id = %context.correlation_id,
                brand = %brand,
                "brand did not resolve; searching without it"
            );
        }
        debug!(
            event_name = "search.plan",
            correlation_id = %context.correlation_id,
            pipeline = %plan.to_pipeline(),
            "search plan built"
        );

        let records = self.catalog.search(&plan).await?;
        info!(
            event_name = "search.completed",
            correlation_id = %context.correlation_id,
            sender_id = %tracker.sender_id,
            results = records.len(),
            qualifiers = filters.applied_qualifiers.len(),
            "product search completed"
        );

        dispatcher.utter(self.renderer.render_variants(&records)?);
        Ok(Self::consumed_slots())
    }
}
