//! Single-product ordering and returns.
//!
//! `action_preview_order` validates the shopper, product, variant and quantity
//! and parks the result in `validated_*` slots. `action_submit_order` posts
//! exactly those slots to the backend after the shopper confirms, so nothing
//! is looked up twice.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use techshop_core::render::format_vnd;
use techshop_db::CatalogRepository;

use crate::backend::{
    BackendClient, BackendError, Buyer, CustomerProfile, OrderItem, OrderRequest, Recipient,
};
use crate::cart::{parse_quantity, CONNECTION_FAILED_MESSAGE};
use crate::dispatcher::Dispatcher;
use crate::error::ActionError;
use crate::events::Event;
use crate::registry::{Action, ActionContext};
use crate::tracker::Tracker;

/// Vietnamese mobile numbers, domestic or `+84` form.
const PHONE_PATTERN: &str = r"^(0|\+84)(3[2-9]|5[689]|7[06-9]|8[1-5]|9[0-46-9])[0-9]{7}$";

const PRODUCT_SLOT: &str = "product";
const VARIANT_SLOT: &str = "variant_name";
const QUANTITY_SLOT: &str = "quantity";
const ORDER_ID_SLOT: &str = "order_id";
const RETURN_REASON_SLOT: &str = "return_reason";

const VALIDATED_PRODUCT: &str = "validated_product_id";
const VALIDATED_VARIANT: &str = "validated_variant_id";
const VALIDATED_QUANTITY: &str = "validated_quantity";
const VALIDATED_PRICE: &str = "validated_price";
const VALIDATED_TOTAL: &str = "validated_total_price";
const VALIDATED_ADDRESS: &str = "validated_address";
const VALIDATED_NAME: &str = "validated_customer_name";
const VALIDATED_PHONE: &str = "validated_phone";

const NEW_ORDER_STATUS: &str = "pending";
const MISSING_NAME: &str = "N/A";

pub const ORDER_LOGIN_MESSAGE: &str = "Để mua hàng, vui lòng đăng nhập.";
pub const PROFILE_MISSING_MESSAGE: &str =
    "Không tìm thấy thông tin người dùng. Vui lòng thử đăng nhập lại.";
pub const PROFILE_UNAVAILABLE_MESSAGE: &str =
    "Xin lỗi, hiện không thể tải thông tin tài khoản của bạn. Vui lòng thử lại sau.";
pub const INVALID_PHONE_MESSAGE: &str =
    "Số điện thoại của bạn không hợp lệ. Vui lòng cập nhật lại thông tin cá nhân.";
pub const ASK_ORDER_PRODUCT_MESSAGE: &str = "Bạn muốn đặt mua sản phẩm nào?";
pub const NO_DEFAULT_ADDRESS: &str = "Chưa có địa chỉ mặc định.";
pub const INCOMPLETE_ORDER_MESSAGE: &str =
    "Đã có lỗi xảy ra. Thông tin đơn hàng không đầy đủ. Vui lòng thử lại từ đầu.";
pub const ORDER_REJECTED_MESSAGE: &str =
    "Xin lỗi, đã có lỗi xảy ra khi gửi đơn hàng đến hệ thống.";
pub const ORDER_CANCELLED_MESSAGE: &str =
    "Đơn hàng của bạn đã được hủy. Nếu bạn cần hỗ trợ thêm, đừng ngần ngại cho tôi biết nhé.";
pub const ASK_ORDER_ID_MESSAGE: &str = "Vui lòng cung cấp mã đơn hàng của bạn.";
pub const ASK_RETURN_REASON_MESSAGE: &str = "Vui lòng cho biết lý do trả hàng.";
pub const RETURN_FAILED_MESSAGE: &str =
    "Có lỗi xảy ra khi xử lý yêu cầu trả hàng. Vui lòng thử lại sau.";
pub const RETURN_CONNECTION_MESSAGE: &str = "Không thể kết nối với hệ thống. Vui lòng thử lại sau.";

fn phone_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(PHONE_PATTERN).ok()).as_ref()
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone_pattern().is_some_and(|pattern| pattern.is_match(phone.trim()))
}

/// Everything the confirmation message shows and the order needs.
#[derive(Clone, Debug, PartialEq, Eq)]
struct OrderDraft {
    customer_name: String,
    phone: String,
    address: String,
    product_id: String,
    product_name: String,
    variant_id: String,
    variant_name: String,
    unit_price: i64,
    quantity: u32,
}

impl OrderDraft {
    fn total(&self) -> i64 {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }

    fn summary(&self) -> String {
        [
            "Vui lòng xác nhận lại thông tin đơn hàng của bạn:".to_string(),
            format!("- Sản phẩm: {}", self.product_name),
            format!("- Phiên bản: {}", self.variant_name),
            format!("- Số lượng: {}", self.quantity),
            format!("- Tổng cộng: {}", format_vnd(self.total())),
            "Thông tin giao hàng:".to_string(),
            format!("- Người nhận: {}", self.customer_name),
            format!("- Số điện thoại: {}", self.phone),
            format!("- Địa chỉ: {}", self.address),
            String::new(),
            "Bạn có muốn xác nhận đặt hàng không?".to_string(),
        ]
        .join("\n")
    }

    fn slot_events(&self) -> Vec<Event> {
        vec![
            Event::slot_set(VALIDATED_PRODUCT, self.product_id.clone()),
            Event::slot_set(VALIDATED_VARIANT, self.variant_id.clone()),
            Event::slot_set(VALIDATED_QUANTITY, self.quantity),
            Event::slot_set(VALIDATED_PRICE, self.unit_price),
            Event::slot_set(VALIDATED_TOTAL, self.total()),
            Event::slot_set(VALIDATED_ADDRESS, self.address.clone()),
            Event::slot_set(VALIDATED_NAME, self.customer_name.clone()),
            Event::slot_set(VALIDATED_PHONE, self.phone.clone()),
        ]
    }
}

/// Outcome of validating an order: a draft or the reason to stop.
enum Validation {
    Ready(OrderDraft),
    /// Ask and keep the collected slots.
    Ask(String),
    /// Explain and start over.
    Reject(String),
}

/// Validates the order slots and shows the confirmation summary.
pub struct PreviewOrder {
    catalog: Arc<dyn CatalogRepository>,
    backend: Arc<BackendClient>,
}

impl PreviewOrder {
    pub const NAME: &'static str = "action_preview_order";

    pub fn new(catalog: Arc<dyn CatalogRepository>, backend: Arc<BackendClient>) -> Self {
        Self { catalog, backend }
    }

    async fn profile(
        &self,
        context: &ActionContext,
        tracker: &Tracker,
    ) -> Result<CustomerProfile, String> {
        match self.backend.customer(&tracker.sender_id, tracker.access_token()).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(PROFILE_MISSING_MESSAGE.to_string()),
            Err(error) => {
                warn!(
                    event_name = "order.profile_failed",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    error = %error,
                    "customer profile lookup failed"
                );
                let message =
                    if error.is_answer() { PROFILE_UNAVAILABLE_MESSAGE } else { CONNECTION_FAILED_MESSAGE };
                Err(message.to_string())
            }
        }
    }

    async fn validate(
        &self,
        context: &ActionContext,
        tracker: &Tracker,
    ) -> Result<Validation, ActionError> {
        if !tracker.has_sender() {
            return Ok(Validation::Reject(ORDER_LOGIN_MESSAGE.to_string()));
        }
        let profile = match self.profile(context, tracker).await {
            Ok(profile) => profile,
            Err(message) => return Ok(Validation::Reject(message)),
        };
        let phone = profile.phone.as_deref().map(str::trim).unwrap_or_default().to_string();
        if !is_valid_phone(&phone) {
            return Ok(Validation::Reject(INVALID_PHONE_MESSAGE.to_string()));
        }

        let Some(product_name) = tracker.slot(PRODUCT_SLOT) else {
            return Ok(Validation::Ask(ASK_ORDER_PRODUCT_MESSAGE.to_string()));
        };
        let Some(product) = self.catalog.find_product_by_name(&product_name).await? else {
            return Ok(Validation::Reject(format!(
                "Xin lỗi, tôi không tìm thấy sản phẩm '{product_name}'. Vui lòng kiểm tra lại."
            )));
        };

        let Some(variant_name) = tracker.slot(VARIANT_SLOT) else {
            return Ok(Validation::Ask(format!("Bạn muốn chọn phiên bản nào cho {}?", product.name)));
        };
        let wanted = variant_name.to_lowercase();
        let variants = self.catalog.variants_for_product(&product.id).await?;
        let Some(variant) = variants.into_iter().find(|variant| {
            variant.name.as_deref().is_some_and(|name| name.to_lowercase().contains(&wanted))
        }) else {
            return Ok(Validation::Reject(format!(
                "Xin lỗi, tôi không tìm thấy phiên bản '{variant_name}' cho sản phẩm {}.",
                product.name
            )));
        };

        let quantity = tracker.slot(QUANTITY_SLOT).as_deref().and_then(parse_quantity).unwrap_or(1);
        let customer_name = profile
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(MISSING_NAME)
            .to_string();
        let address = profile.default_address().unwrap_or_else(|| NO_DEFAULT_ADDRESS.to_string());

        Ok(Validation::Ready(OrderDraft {
            customer_name,
            phone,
            address,
            product_id: product.id.0,
            product_name: product.name,
            variant_name: variant.name.clone().unwrap_or_default(),
            variant_id: variant.id.0,
            unit_price: variant.price,
            quantity,
        }))
    }
}

#[async_trait]
impl Action for PreviewOrder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        match self.validate(context, tracker).await? {
            Validation::Ready(draft) => {
                dispatcher.utter(draft.summary());
                Ok(draft.slot_events())
            }
            Validation::Ask(question) => {
                dispatcher.utter(question);
                Ok(Vec::new())
            }
            Validation::Reject(reason) => {
                dispatcher.utter(reason);
                Ok(vec![Event::AllSlotsReset])
            }
        }
    }
}

/// Posts the order parked by [`PreviewOrder`].
pub struct SubmitOrder {
    backend: Arc<BackendClient>,
}

impl SubmitOrder {
    pub const NAME: &'static str = "action_submit_order";

    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

fn order_from_slots(tracker: &Tracker) -> Option<OrderRequest> {
    let product = tracker.slot(VALIDATED_PRODUCT)?;
    let variant = tracker.slot(VALIDATED_VARIANT)?;
    let quantity = tracker.slot(VALIDATED_QUANTITY)?.parse::<u32>().ok().filter(|q| *q > 0)?;
    let price = tracker.slot(VALIDATED_PRICE)?.parse::<i64>().ok()?;
    let total_price = tracker.slot(VALIDATED_TOTAL)?.parse::<i64>().ok()?;
    let address = tracker.slot(VALIDATED_ADDRESS).unwrap_or_default();
    let name = tracker.slot(VALIDATED_NAME).unwrap_or_default();
    let phone = tracker.slot(VALIDATED_PHONE).unwrap_or_default();

    Some(OrderRequest {
        user: tracker.sender_id.clone(),
        recipient: Recipient { name: name.clone(), phone: phone.clone(), address: address.clone() },
        buyer: Buyer { name: name.clone(), phone: phone.clone() },
        items: vec![OrderItem { product, variant, quantity, price }],
        total_price,
        shipping_address: address,
        phone,
        customer_name: name,
        status: NEW_ORDER_STATUS,
    })
}

#[async_trait]
impl Action for SubmitOrder {
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
            dispatcher.utter(ORDER_LOGIN_MESSAGE);
            return Ok(vec![Event::AllSlotsReset]);
        }
        let Some(order) = order_from_slots(tracker) else {
            dispatcher.utter(INCOMPLETE_ORDER_MESSAGE);
            return Ok(vec![Event::AllSlotsReset]);
        };

        match self.backend.create_order(&order, tracker.access_token()).await {
            Ok(order_id) => {
                info!(
                    event_name = "order.created",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    order_id = %order_id,
                    total_price = order.total_price,
                    "order submitted"
                );
                dispatcher.utter(format!("Đặt hàng thành công! Mã đơn hàng của bạn là #{order_id}."));
            }
            Err(error) => {
                warn!(
                    event_name = "order.submit_failed",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    error = %error,
                    "order submission failed"
                );
                dispatcher.utter(if error.is_answer() {
                    ORDER_REJECTED_MESSAGE
                } else {
                    CONNECTION_FAILED_MESSAGE
                });
            }
        }
        Ok(vec![Event::AllSlotsReset])
    }
}

/// Abandons the order being collected. Nothing was sent to the backend yet.
pub struct CancelOrder;

impl CancelOrder {
    pub const NAME: &'static str = "action_cancel_order";
}

#[async_trait]
impl Action for CancelOrder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        _context: &ActionContext,
        dispatcher: &mut Dispatcher,
        _tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        dispatcher.utter(ORDER_CANCELLED_MESSAGE);
        Ok(vec![Event::AllSlotsReset])
    }
}

/// Files a return request. The backend decides eligibility: only delivered
/// orders that were not returned yet are accepted.
pub struct ReturnOrder {
    backend: Arc<BackendClient>,
}

impl ReturnOrder {
    pub const NAME: &'static str = "action_return_order";

    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}

fn return_refused(order_id: &str, status: u16) -> String {
    match status {
        404 => format!("Không tìm thấy đơn hàng với mã: {order_id}. Vui lòng kiểm tra lại."),
        400 | 409 | 422 => format!(
            "Đơn hàng {order_id} chưa đủ điều kiện trả hàng. Chỉ đơn đã giao và chưa trả mới được yêu cầu trả hàng. Vui lòng liên hệ hỗ trợ nếu cần."
        ),
        _ => RETURN_FAILED_MESSAGE.to_string(),
    }
}

#[async_trait]
impl Action for ReturnOrder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        context: &ActionContext,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Result<Vec<Event>, ActionError> {
        let Some(raw_id) = tracker.slot(ORDER_ID_SLOT) else {
            dispatcher.utter(ASK_ORDER_ID_MESSAGE);
            return Ok(Vec::new());
        };
        let Some(reason) = tracker.slot(RETURN_REASON_SLOT) else {
            dispatcher.utter(ASK_RETURN_REASON_MESSAGE);
            return Ok(Vec::new());
        };
        let order_id = raw_id.trim_start_matches('#').trim();

        match self.backend.request_return(order_id, &reason, tracker.access_token()).await {
            Ok(()) => {
                info!(
                    event_name = "order.return_requested",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    order_id = %order_id,
                    "return request filed"
                );
                dispatcher.utter(format!(
                    "Yêu cầu trả hàng của bạn đã được ghi nhận. Mã đơn hàng: {order_id}. Chúng tôi sẽ liên hệ với bạn để hướng dẫn tiếp theo."
                ));
            }
            Err(error) => {
                warn!(
                    event_name = "order.return_failed",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    order_id = %order_id,
                    error = %error,
                    "return request failed"
                );
                let message = match &error {
                    BackendError::Rejected { status, .. } => return_refused(order_id, *status),
                    BackendError::Decode { .. } => RETURN_FAILED_MESSAGE.to_string(),
                    BackendError::Http(_) | BackendError::InvalidUrl(_) => {
                        RETURN_CONNECTION_MESSAGE.to_string()
                    }
                };
                dispatcher.utter(message);
            }
        }
        Ok(vec![Event::AllSlotsReset])
    }
}
