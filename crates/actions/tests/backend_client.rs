//! Integration tests for `BackendClient` using wiremock HTTP mocks.

use secrecy::SecretString;
use serde_json::json;
use techshop_actions::backend::{
    BackendClient, BackendError, Buyer, CartItem, CartLine, CartRequest, CartUpdate, OrderItem,
    OrderRequest, Recipient, RemoveCartItem,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> BackendClient {
    BackendClient::with_base_url(base_url, 10).expect("client construction should not fail")
}

fn one_item() -> CartRequest {
    CartRequest {
        items: vec![CartItem {
            product: "p-iphone-15".to_string(),
            variant: "v-iphone-15-128".to_string(),
            quantity: 2,
        }],
    }
}

#[tokio::test]
async fn add_to_cart_posts_items_with_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/carts"))
        .and(header("authorization", "Bearer tok-123"))
        .and(body_json(json!({
            "items": [{ "product": "p-iphone-15", "variant": "v-iphone-15-128", "quantity": 2 }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&format!("{}/api/v1", server.uri()));
    let token = SecretString::from("tok-123".to_string());

    client.add_to_cart(&one_item(), Some(&token)).await.expect("cart accepted");
}

#[tokio::test]
async fn add_to_cart_without_token_sends_no_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/carts"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    client.add_to_cart(&one_item(), None).await.expect("cart accepted");

    let received = server.received_requests().await.expect("recorded requests");
    assert_eq!(received.len(), 1);
    assert!(!received[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn add_to_cart_reports_non_success_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/carts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let error = client.add_to_cart(&one_item(), None).await.expect_err("should be rejected");

    match error {
        BackendError::Rejected { endpoint, status, body } => {
            assert_eq!(endpoint, "carts");
            assert_eq!(status, 401);
            assert_eq!(body, "token expired");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn add_to_cart_treats_other_2xx_as_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let error = client.add_to_cart(&one_item(), None).await.expect_err("204 is not a success");

    assert!(matches!(error, BackendError::Rejected { status: 204, .. }));
}

#[tokio::test]
async fn add_to_cart_surfaces_connection_failure() {
    let server = MockServer::builder().start().await;
    let uri = server.uri();
    drop(server);

    let client = test_client(&uri);
    let error = client.add_to_cart(&one_item(), None).await.expect_err("server is gone");

    assert!(matches!(error, BackendError::Http(_)));
}

fn token() -> SecretString {
    SecretString::from("tok-9".to_string())
}

#[tokio::test]
async fn cart_reads_the_data_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/carts"))
        .and(header("authorization", "Bearer tok-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "_id": "cart-1",
                "items": [{ "product": "p-iphone-15", "variant": "v-ip15-128", "color": "Hồng", "quantity": 2, "price": 19990000 }],
                "totalPrice": 39980000,
                "totalQuantity": 2
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cart = test_client(&server.uri())
        .cart(Some(&token()))
        .await
        .expect("cart read")
        .expect("cart present");

    assert_eq!(cart.id, "cart-1");
    assert_eq!(cart.items[0].color, "Hồng");
    assert_eq!(cart.totals(), (2, 39_980_000));
}

#[tokio::test]
async fn missing_cart_reads_as_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/carts"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no cart"))
        .mount(&server)
        .await;

    let cart = test_client(&server.uri()).cart(None).await.expect("404 is not an error");
    assert_eq!(cart, None);
}

#[tokio::test]
async fn malformed_cart_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/carts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let error = test_client(&server.uri()).cart(None).await.expect_err("not json");
    assert!(matches!(error, BackendError::Decode { endpoint: "carts", .. }), "{error:?}");
    assert!(error.is_answer());
}

#[tokio::test]
async fn update_cart_patches_the_full_line_list() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/carts/cart-1"))
        .and(header("authorization", "Bearer tok-9"))
        .and(body_json(json!({
            "user": "u-9",
            "items": [{
                "product": "p-galaxy-a55",
                "variant": "v-a55",
                "color": "Xanh",
                "quantity": 3,
                "price": 9990000,
                "branch": "branch-hcm"
            }]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let update = CartUpdate {
        user: "u-9".to_string(),
        items: vec![CartLine {
            product: "p-galaxy-a55".to_string(),
            variant: "v-a55".to_string(),
            color: "Xanh".to_string(),
            quantity: 3,
            price: 9_990_000,
            branch: Some("branch-hcm".to_string()),
        }],
    };

    test_client(&format!("{}/api/v1", server.uri()))
        .update_cart("cart-1", &update, Some(&token()))
        .await
        .expect("update accepted");
}

#[tokio::test]
async fn remove_cart_item_sends_ids_in_the_delete_body() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/carts/remove-item"))
        .and(body_json(json!({ "productId": "p-iphone-15", "variantId": "v-ip15-128" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let item = RemoveCartItem {
        product_id: "p-iphone-15".to_string(),
        variant_id: "v-ip15-128".to_string(),
    };
    test_client(&server.uri()).remove_cart_item(&item, None).await.expect("item removed");
}

#[tokio::test]
async fn remove_cart_item_reports_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(400).set_body_string("not in cart"))
        .mount(&server)
        .await;

    let item = RemoveCartItem { product_id: "p".to_string(), variant_id: "v".to_string() };
    let error = test_client(&server.uri()).remove_cart_item(&item, None).await.expect_err("rejected");

    assert!(
        matches!(error, BackendError::Rejected { endpoint: "carts/remove-item", status: 400, .. }),
        "{error:?}"
    );
}

#[tokio::test]
async fn customer_profile_is_read_by_user_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/u-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "name": "Nguyễn Văn An",
                "phone": "0912345678",
                "addresses": [{ "specificAddress": "12 Lê Lợi", "addressDetail": "Quận 1", "default": true }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = test_client(&server.uri())
        .customer("u-9", None)
        .await
        .expect("profile read")
        .expect("profile present");

    assert_eq!(profile.phone.as_deref(), Some("0912345678"));
    assert_eq!(profile.default_address().as_deref(), Some("12 Lê Lợi, Quận 1"));
}

#[tokio::test]
async fn create_order_posts_the_order_and_returns_its_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer tok-9"))
        .and(body_json(json!({
            "user": "u-9",
            "recipient": { "name": "An", "phone": "0912345678", "address": "12 Lê Lợi, Quận 1" },
            "buyer": { "name": "An", "phone": "0912345678" },
            "items": [{ "product": "p-galaxy-a55", "variant": "v-a55", "quantity": 1, "price": 9990000 }],
            "totalPrice": 9990000,
            "shippingAddress": "12 Lê Lợi, Quận 1",
            "phone": "0912345678",
            "customerName": "An",
            "status": "pending"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "_id": "ord-77" } })))
        .expect(1)
        .mount(&server)
        .await;

    let order = OrderRequest {
        user: "u-9".to_string(),
        recipient: Recipient {
            name: "An".to_string(),
            phone: "0912345678".to_string(),
            address: "12 Lê Lợi, Quận 1".to_string(),
        },
        buyer: Buyer { name: "An".to_string(), phone: "0912345678".to_string() },
        items: vec![OrderItem {
            product: "p-galaxy-a55".to_string(),
            variant: "v-a55".to_string(),
            quantity: 1,
            price: 9_990_000,
        }],
        total_price: 9_990_000,
        shipping_address: "12 Lê Lợi, Quận 1".to_string(),
        phone: "0912345678".to_string(),
        customer_name: "An".to_string(),
        status: "pending",
    };

    let id = test_client(&server.uri()).create_order(&order, Some(&token())).await.expect("order created");
    assert_eq!(id, "ord-77");
}

#[tokio::test]
async fn request_return_patches_the_reason() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/orders/request-return/ord-77"))
        .and(body_json(json!({ "returnReason": "Máy bị lỗi màn hình" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server.uri())
        .request_return("ord-77", "Máy bị lỗi màn hình", None)
        .await
        .expect("return requested");
}
