use std::sync::Arc;

use async_trait::async_trait;

use techshop_core::render::format_vnd;
use techshop_db::CatalogRepository;

use super::{line_names, open_cart, LOGIN_REQUIRED_MESSAGE};
use crate::backend::{BackendClient, Cart};
use crate::dispatcher::Dispatcher;
use crate::error::ActionError;
use crate::events::Event;
use crate::registry::{Action, ActionContext};
use crate::tracker::Tracker;

const UNKNOWN_PRODUCT: &str = "Sản phẩm";

fn cart_summary(cart: &Cart, names: &[Option<String>]) -> String {
    let mut lines = vec!["Giỏ hàng của bạn:".to_string()];
    for (line, name) in cart.items.iter().zip(names) {
        let name = name.as_deref().unwrap_or(UNKNOWN_PRODUCT);
        let color = match line.color.trim() {
            "" => String::new(),
            color => format!(" (Màu: {color})"),
        };
        lines.push(format!("- {name}{color} x{}: {}", line.quantity, format_vnd(line.subtotal())));
    }
    let (quantity, total) = cart.totals();
    lines.push(format!("Tổng số lượng: {quantity}"));
    lines.push(format!("Tổng cộng: {}", format_vnd(total)));
    lines.join("\n")
}

pub struct ViewCart {
    catalog: Arc<dyn CatalogRepository>,
    backend: Arc<BackendClient>,
}

impl ViewCart {
    pub const NAME: &'static str = "action_view_cart";

    pub fn new(catalog: Arc<dyn CatalogRepository>, backend: Arc<BackendClient>) -> Self {
        Self { catalog, backend }
    }
}

#[async_trait]
impl Action for ViewCart {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        if !tracker.has_sender() {
            dispatcher.utter(LOGIN_REQUIRED_MESSAGE);
            return Ok(Vec::new());
        }

        let Some(cart) = open_cart(&self.backend, context, tracker, dispatcher).await else {
            return Ok(Vec::new());
        };

        let names = line_names(self.catalog.as_ref(), &cart).await?;
        dispatcher.utter(cart_summary(&cart, &names));
        Ok(Vec::new())
    }
}
