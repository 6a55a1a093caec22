//! Cart actions. The cart itself lives in the REST backend; these actions
//! resolve names against the catalog and send the resulting ids.

pub mod edit;
pub mod view;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use techshop_core::domain::product::{ProductId, Variant};
use techshop_core::search::numeric::extract_number;
use techshop_db::CatalogRepository;

use crate::backend::{BackendClient, Cart, CartItem, CartRequest};
use crate::dispatcher::Dispatcher;
use crate::error::ActionError;
use crate::events::Event;
use crate::registry::{Action, ActionContext};
use crate::tracker::Tracker;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Quý khách vui lòng đăng nhập để sử dụng dịch vụ?";
pub const ASK_PRODUCT_MESSAGE: &str = "Bạn muốn thêm sản phẩm nào vào giỏ hàng?";
pub const PRODUCT_MISSING_MESSAGE: &str = "Sản phẩm quý khách muốn thêm hiện không tồn tại trên hệ thống. Xin quý khách vui lòng lựa chọn một sản phẩm khác!";
pub const ASK_QUANTITY_MESSAGE: &str = "Bạn muốn thêm bao nhiêu sản phẩm?";
pub const CART_SUCCESS_MESSAGE: &str =
    "Hành động thêm vào giỏ hàng đã được thực hiện thành công!.";
pub const CART_REJECTED_MESSAGE: &str =
    "Xin lỗi, đã có lỗi xảy ra trong quá trình thực hiện hành động thêm vào giỏ hàng .";
pub const CONNECTION_FAILED_MESSAGE: &str = "Đã có lỗi kết nối đến máy chủ. Vui lòng thử lại sau.";
pub const EMPTY_CART_MESSAGE: &str = "Giỏ hàng của bạn hiện đang trống.";
pub const CART_UNAVAILABLE_MESSAGE: &str =
    "Xin lỗi, hiện không thể tải giỏ hàng của bạn. Vui lòng thử lại sau.";

const PRODUCT_SLOT: &str = "product";
const VARIANT_SLOT: &str = "variant_name_add";
const COLOR_SLOT: &str = "variant_color";
const QUANTITY_SLOT: &str = "quantity";

fn ask_variant(product: &str) -> String {
    format!("Bạn muốn chọn phiên bản nào cho {product}?")
}

fn ask_color(variant: &str) -> String {
    format!("Bạn muốn chọn màu gì cho {variant}?")
}

fn variant_unavailable(product: &str, variant: &str, color: &str) -> String {
    format!("Xin lỗi, {product} hiện không có phiên bản '{variant}' màu '{color}'. Quý khách vui lòng chọn phiên bản hoặc màu khác!")
}

/// First variant whose name contains `query` and that is offered in `color`.
fn find_variant<'a>(variants: &'a [Variant], query: &str, color: &str) -> Option<&'a Variant> {
    let wanted = query.trim().to_lowercase();
    variants.iter().find(|variant| {
        variant.name.as_deref().is_some_and(|name| name.to_lowercase().contains(&wanted))
            && variant.has_color(color)
    })
}

pub(crate) fn parse_quantity(raw: &str) -> Option<u32> {
    extract_number(raw).and_then(|value| u32::try_from(value).ok()).filter(|value| *value > 0)
}

/// The shopper's cart when it has lines. Otherwise tells the shopper why
/// and returns `None`.
async fn open_cart(
    backend: &BackendClient,
    context: &ActionContext,
    tracker: &Tracker,
    dispatcher: &mut Dispatcher,
) -> Option<Cart> {
    match backend.cart(tracker.access_token()).await {
        Ok(Some(cart)) if !cart.is_empty() => Some(cart),
        Ok(_) => {
            dispatcher.utter(EMPTY_CART_MESSAGE);
            None
        }
        Err(error) => {
            warn!(
                event_name = "cart.read_failed",
                correlation_id = %context.correlation_id,
                sender_id = %tracker.sender_id,
                error = %error,
                "cart read failed"
            );
            dispatcher.utter(if error.is_answer() {
                CART_UNAVAILABLE_MESSAGE
            } else {
                CONNECTION_FAILED_MESSAGE
            });
            None
        }
    }
}

/// Catalog name of every cart line, `None` where the product is gone.
async fn line_names(
    catalog: &dyn CatalogRepository,
    cart: &Cart,
) -> Result<Vec<Option<String>>, ActionError> {
    let mut names = Vec::with_capacity(cart.items.len());
    for line in &cart.items {
        let product = catalog.find_product(&ProductId(line.product.clone())).await?;
        names.push(product.map(|product| product.name));
    }
    Ok(names)
}

/// Index of the first line whose product name contains `query`.
fn find_line(names: &[Option<String>], query: &str) -> Option<usize> {
    let query = query.trim().to_lowercase();
    names.iter().position(|name| {
        name.as_deref().is_some_and(|name| name.to_lowercase().contains(&query))
    })
}

/// Collects product, variant, color and quantity one question at a time,
/// then posts the line to the backend cart.
pub struct AddToCart {
    catalog: Arc<dyn CatalogRepository>,
    backend: Arc<BackendClient>,
}

impl AddToCart {
    pub const NAME: &'static str = "action_add_to_cart";

    pub fn new(catalog: Arc<dyn CatalogRepository>, backend: Arc<BackendClient>) -> Self {
        Self { catalog, backend }
    }
}

#[async_trait]
impl Action for AddToCart {
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

        let Some(product_name) = tracker.slot(PRODUCT_SLOT) else {
            dispatcher.utter(ASK_PRODUCT_MESSAGE);
            return Ok(Vec::new());
        };

        let Some(product) = self.catalog.find_product_by_name(&product_name).await? else {
            dispatcher.utter(PRODUCT_MISSING_MESSAGE);
            return Ok(vec![Event::clear_slot(PRODUCT_SLOT)]);
        };

        let Some(variant_name) = tracker.slot(VARIANT_SLOT) else {
            dispatcher.utter(ask_variant(&product_name));
            return Ok(Vec::new());
        };

        let Some(color) = tracker.slot(COLOR_SLOT) else {
            dispatcher.utter(ask_color(&variant_name));
            return Ok(Vec::new());
        };

        let variants = self.catalog.variants_for_product(&product.id).await?;
        let Some(variant) = find_variant(&variants, &variant_name, &color) else {
            dispatcher.utter(variant_unavailable(&product.name, &variant_name, &color));
            return Ok(Event::clear_slots([VARIANT_SLOT, COLOR_SLOT]));
        };

        let Some(quantity) = tracker.slot(QUANTITY_SLOT).as_deref().and_then(parse_quantity) else {
            dispatcher.utter(ASK_QUANTITY_MESSAGE);
            return Ok(vec![Event::clear_slot(QUANTITY_SLOT)]);
        };

        let request = CartRequest {
            items: vec![CartItem {
                product: product.id.0.clone(),
                variant: variant.id.0.clone(),
                quantity,
            }],
        };

        match self.backend.add_to_cart(&request, tracker.access_token()).await {
            Ok(()) => {
                info!(
                    event_name = "cart.item_added",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    product_id = %product.id.0,
                    variant_id = %variant.id.0,
                    quantity,
                    "cart updated"
                );
                dispatcher.utter(CART_SUCCESS_MESSAGE);
            }
            Err(error) if error.is_answer() => {
                warn!(
                    event_name = "cart.rejected",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    error = %error,
                    "backend rejected cart update"
                );
                dispatcher.utter(CART_REJECTED_MESSAGE);
            }
            Err(error) => {
                warn!(
                    event_name = "cart.backend_unreachable",
                    correlation_id = %context.correlation_id,
                    sender_id = %tracker.sender_id,
                    error = %error,
                    "cart update failed"
                );
                dispatcher.utter(CONNECTION_FAILED_MESSAGE);
            }
        }

        Ok(vec![Event::AllSlotsReset])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::test_support::demo_catalog;

    async fn run(backend_url: &str, tracker: Tracker) -> (Vec<Event>, Vec<String>) {
        let backend = Arc::new(BackendClient::with_base_url(backend_url, 5).expect("client"));
        let action = AddToCart::new(demo_catalog().await, backend);
        let mut dispatcher = Dispatcher::new();
        let events =
            action.run(&ActionContext::default(), &mut dispatcher, &tracker).await.expect("runs");
        (events, dispatcher.into_messages().into_iter().map(|m| m.text).collect())
    }

    fn full_tracker() -> Tracker {
        Tracker::new("u-7")
            .with_slot("product", "iphone 15")
            .with_slot("variant_name_add", "256")
            .with_slot("variant_color", "hồng")
            .with_slot("quantity", "2 cái")
            .with_access_token("tok-7")
    }

    #[test]
    fn line_lookup_skips_missing_products() {
        let names = vec![None, Some("Galaxy A55".to_string()), Some("iPhone 15".to_string())];

        assert_eq!(find_line(&names, " IPHONE "), Some(2));
        assert_eq!(find_line(&names, "galaxy"), Some(1));
        assert_eq!(find_line(&names, "Pixel"), None);
    }

    #[test]
    fn quantity_must_be_positive_integer() {
        assert_eq!(parse_quantity("3"), Some(3));
        assert_eq!(parse_quantity("2 cái"), Some(2));
        assert_eq!(parse_quantity("0"), None);
        assert_eq!(parse_quantity("vài"), None);
    }

    #[tokio::test]
    async fn asks_one_question_at_a_time() {
        let unused = "http://127.0.0.1:9";

        let (_, messages) = run(unused, Tracker::default()).await;
        assert_eq!(messages, vec![LOGIN_REQUIRED_MESSAGE]);

        let (_, messages) = run(unused, Tracker::new("u")).await;
        assert_eq!(messages, vec![ASK_PRODUCT_MESSAGE]);

        let (events, messages) = run(unused, Tracker::new("u").with_slot("product", "Nokia")).await;
        assert_eq!(messages, vec![PRODUCT_MISSING_MESSAGE]);
        assert_eq!(events, vec![Event::clear_slot("product")]);

        let (_, messages) = run(unused, Tracker::new("u").with_slot("product", "iPhone 15")).await;
        assert_eq!(messages, vec!["Bạn muốn chọn phiên bản nào cho iPhone 15?"]);

        let (_, messages) = run(
            unused,
            Tracker::new("u").with_slot("product", "iPhone 15").with_slot("variant_name_add", "128GB"),
        )
        .await;
        assert_eq!(messages, vec!["Bạn muốn chọn màu gì cho 128GB?"]);

        let (_, messages) = run(
            unused,
            Tracker::new("u")
                .with_slot("product", "iPhone 15")
                .with_slot("variant_name_add", "128GB")
                .with_slot("variant_color", "Đen"),
        )
        .await;
        assert_eq!(messages, vec![ASK_QUANTITY_MESSAGE]);
    }

    #[tokio::test]
    async fn unavailable_color_clears_variant_choice() {
        let (events, messages) = run(
            "http://127.0.0.1:9",
            Tracker::new("u")
                .with_slot("product", "iPhone 15")
                .with_slot("variant_name_add", "256GB")
                .with_slot("variant_color", "Đen")
                .with_slot("quantity", 1),
        )
        .await;

        assert!(messages[0].contains("'256GB' màu 'Đen'"), "{}", messages[0]);
        assert_eq!(
            events,
            vec![Event::clear_slot("variant_name_add"), Event::clear_slot("variant_color")]
        );
    }

    #[tokio::test]
    async fn posts_resolved_line_and_resets_slots() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/carts"))
            .and(header("authorization", "Bearer tok-7"))
            .and(body_json(json!({
                "items": [{ "product": "p-iphone-15", "variant": "v-ip15-256", "quantity": 2 }]
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let (events, messages) = run(&server.uri(), full_tracker()).await;

        assert_eq!(messages, vec![CART_SUCCESS_MESSAGE]);
        assert_eq!(events, vec![Event::AllSlotsReset]);
    }

    #[tokio::test]
    async fn backend_failures_map_to_fixed_messages() {
        let server = MockServer::builder().start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (events, messages) = run(&server.uri(), full_tracker()).await;
        assert_eq!(messages, vec![CART_REJECTED_MESSAGE]);
        assert_eq!(events, vec![Event::AllSlotsReset]);

        let uri = server.uri();
        drop(server);
        let (events, messages) = run(&uri, full_tracker()).await;
        assert_eq!(messages, vec![CONNECTION_FAILED_MESSAGE]);
        assert_eq!(events, vec![Event::AllSlotsReset]);
    }
}
