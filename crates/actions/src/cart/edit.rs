use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use techshop_db::CatalogRepository;

use super::{find_line, line_names, open_cart, parse_quantity, CONNECTION_FAILED_MESSAGE};
use crate::backend::{BackendClient, CartUpdate, RemoveCartItem};
use crate::dispatcher::Dispatcher;
use crate::error::ActionError;
use crate::events::Event;
use crate::registry::{Action, ActionContext};
use crate::tracker::Tracker;

const PRODUCT_NAME_SLOT: &str = "product_name";
const QUANTITY_ACTION_SLOT: &str = "quantity_action";
const QUANTITY_CHANGE_SLOT: &str = "quantity_change";

pub const UPDATE_LOGIN_MESSAGE: &str = "Quý khách vui lòng đăng nhập để thực hiện thao tác này.";
pub const ASK_UPDATE_PRODUCT_MESSAGE: &str = "Bạn muốn cập nhật số lượng cho sản phẩm nào?";
pub const UPDATE_REJECTED_MESSAGE: &str = "⚠ Có lỗi xảy ra khi cập nhật giỏ hàng. Vui lòng thử lại.";
pub const UPDATE_CONNECTION_MESSAGE: &str = "⚠ Lỗi kết nối đến hệ thống. Vui lòng thử lại.";

pub const DELETE_LOGIN_MESSAGE: &str = "Vui lòng đăng nhập để xóa sản phẩm khỏi giỏ hàng!";
pub const ASK_DELETE_PRODUCT_MESSAGE: &str = "Bạn vui lòng cho biết tên sản phẩm cần xóa!";
pub const DELETE_REJECTED_MESSAGE: &str = "Xin lỗi, đã có lỗi xảy ra khi xóa sản phẩm khỏi giỏ hàng.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Adjustment {
    Increase,
    Decrease,
}

impl Adjustment {
    /// Anything but `decrease` adds.
    fn from_slot(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("decrease") => Self::Decrease,
            _ => Self::Increase,
        }
    }

    fn apply(self, current: u32, change: u32) -> u32 {
        match self {
            Self::Increase => current.saturating_add(change),
            Self::Decrease => current.saturating_sub(change),
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Increase => "tăng",
            Self::Decrease => "giảm",
        }
    }
}

fn clear_adjustment() -> Vec<Event> {
    Event::clear_slots([QUANTITY_ACTION_SLOT, QUANTITY_CHANGE_SLOT])
}

/// Raises or lowers the quantity of one cart line. A line that drops to zero
/// is removed; lines whose product left the catalog are dropped too.
pub struct UpdateCartQuantity {
    catalog: Arc<dyn CatalogRepository>,
    backend: Arc<BackendClient>,
}

impl UpdateCartQuantity {
    pub const NAME: &'static str = "action_update_cart_quantity";

    pub fn new(catalog: Arc<dyn CatalogRepository>, backend: Arc<BackendClient>) -> Self {
        Self { catalog, backend }
    }
}

#[async_trait]
impl Action for UpdateCartQuantity {
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
            dispatcher.utter(UPDATE_LOGIN_MESSAGE);
            return Ok(clear_adjustment());
        }
        let Some(query) = tracker.slot(PRODUCT_NAME_SLOT) else {
            dispatcher.utter(ASK_UPDATE_PRODUCT_MESSAGE);
            return Ok(clear_adjustment());
        };
        let Some(cart) = open_cart(&self.backend, context, tracker, dispatcher).await else {
            return Ok(clear_adjustment());
        };

        let names = line_names(self.catalog.as_ref(), &cart).await?;
        let Some(index) = find_line(&names, &query) else {
            dispatcher.utter(format!("Không tìm thấy sản phẩm {query} trong giỏ hàng của bạn."));
            return Ok(clear_adjustment());
        };

        let adjustment = Adjustment::from_slot(tracker.slot(QUANTITY_ACTION_SLOT).as_deref());
        let change = tracker.slot(QUANTITY_CHANGE_SLOT).as_deref().and_then(parse_quantity).unwrap_or(1);
        let product_name = names[index].clone().unwrap_or_default();
        let new_quantity = adjustment.apply(cart.items[index].quantity, change);

        let items = cart
            .items
            .iter()
            .zip(&names)
            .enumerate()
            .filter(|(_, (_, name))| name.is_some())
            .filter_map(|(position, (line, _))| {
                if position != index {
                    return Some(line.clone());
                }
                (new_quantity > 0).then(|| {
                    let mut line = line.clone();
                    line.quantity = new_quantity;
                    line
                })
            })
            .collect();
        let update = CartUpdate { user: tracker.sender_id.clone(), items };

        match self.backend.update_cart(&cart.id, &update, tracker.access_token()).await {
            Ok(()) => {
                info!(
                    event_name = "cart.quantity_updated",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    cart_id = %cart.id,
                    product_id = %cart.items[index].product,
                    quantity = new_quantity,
                    "cart quantity updated"
                );
                if new_quantity > 0 {
                    dispatcher.utter(format!(
                        "✓ Đã {} {change} {product_name} trong giỏ hàng. Số lượng hiện tại: {new_quantity}.",
                        adjustment.verb()
                    ));
                } else {
                    dispatcher.utter(format!("✓ Đã xóa {product_name} khỏi giỏ hàng."));
                }
            }
            Err(error) => {
                warn!(
                    event_name = "cart.update_failed",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    error = %error,
                    "cart quantity update failed"
                );
                dispatcher.utter(if error.is_answer() {
                    UPDATE_REJECTED_MESSAGE
                } else {
                    UPDATE_CONNECTION_MESSAGE
                });
            }
        }

        Ok(clear_adjustment())
    }
}

pub struct DeleteFromCart {
    catalog: Arc<dyn CatalogRepository>,
    backend: Arc<BackendClient>,
}

impl DeleteFromCart {
    pub const NAME: &'static str = "action_delete_from_cart";

    pub fn new(catalog: Arc<dyn CatalogRepository>, backend: Arc<BackendClient>) -> Self {
        Self { catalog, backend }
    }
}

#[async_trait]
impl Action for DeleteFromCart {
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
            dispatcher.utter(DELETE_LOGIN_MESSAGE);
            return Ok(Vec::new());
        }
        let Some(cart) = open_cart(&self.backend, context, tracker, dispatcher).await else {
            return Ok(Vec::new());
        };
        let Some(query) = tracker.slot(PRODUCT_NAME_SLOT) else {
            dispatcher.utter(ASK_DELETE_PRODUCT_MESSAGE);
            return Ok(Vec::new());
        };

        let names = line_names(self.catalog.as_ref(), &cart).await?;
        let Some(index) = find_line(&names, &query) else {
            dispatcher.utter(format!("Sản phẩm '{query}' không tồn tại trong giỏ hàng của bạn."));
            return Ok(vec![Event::AllSlotsReset]);
        };

        let line = &cart.items[index];
        let item = RemoveCartItem { product_id: line.product.clone(), variant_id: line.variant.clone() };
        match self.backend.remove_cart_item(&item, tracker.access_token()).await {
            Ok(()) => {
                info!(
                    event_name = "cart.item_removed",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    product_id = %item.product_id,
                    variant_id = %item.variant_id,
                    "cart line removed"
                );
                let name = names[index].as_deref().unwrap_or_default();
                dispatcher.utter(format!("Sản phẩm {name} đã được xóa khỏi giỏ hàng thành công."));
            }
            Err(error) => {
                warn!(
                    event_name = "cart.remove_failed",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    error = %error,
                    "cart line removal failed"
                );
                dispatcher.utter(if error.is_answer() {
                    DELETE_REJECTED_MESSAGE
                } else {
                    CONNECTION_FAILED_MESSAGE
                });
            }
        }

        Ok(vec![Event::AllSlotsReset])
    }
}
