//! Client for the shop's REST backend.
//!
//! The backend owns carts, orders and customer profiles; the action server
//! only reads and mutates them through here. Requests carry the shopper's
//! bearer token when the channel forwarded one, and successful responses wrap
//! their payload in a `{"data": ...}` envelope.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use techshop_core::config::BackendConfig;

const USER_AGENT: &str = "techshop-actions/0.1";

#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, timeout or TLS failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    /// The backend answered with something other than 200 or 201.
    #[error("backend rejected {endpoint} with status {status}: {body}")]
    Rejected { endpoint: &'static str, status: u16, body: String },

    /// A success status whose body does not have the expected shape.
    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: &'static str, message: String },
}

impl BackendError {
    /// True when the backend was reached and answered; false for transport
    /// failures.
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Decode { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub product: String,
    pub variant: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartRequest {
    pub items: Vec<CartItem>,
}

/// References arrive either as a bare id or populated as `{"_id": ...}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRef {
    Plain(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
    },
}

impl From<IdRef> for String {
    fn from(reference: IdRef) -> Self {
        match reference {
            IdRef::Plain(id) | IdRef::Populated { id } => id,
        }
    }
}

fn id_ref<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    IdRef::deserialize(deserializer).map(String::from)
}

fn optional_id_ref<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<IdRef>::deserialize(deserializer).map(|reference| reference.map(String::from))
}

fn one() -> u32 {
    1
}

/// One line of a shopper's cart as the backend stores it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(deserialize_with = "id_ref")]
    pub product: String,
    #[serde(deserialize_with = "id_ref")]
    pub variant: String,
    #[serde(default)]
    pub color: String,
    #[serde(default = "one")]
    pub quantity: u32,
    /// Unit price in VND.
    #[serde(default)]
    pub price: i64,
    #[serde(default, deserialize_with = "optional_id_ref", skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl CartLine {
    pub fn subtotal(&self) -> i64 {
        self.price.saturating_mul(i64::from(self.quantity))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub total_price: Option<i64>,
    #[serde(default)]
    pub total_quantity: Option<u32>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.is_deleted || self.items.is_empty()
    }

    /// The backend's totals when it sent them, otherwise summed from lines.
    pub fn totals(&self) -> (u32, i64) {
        let quantity = self
            .total_quantity
            .unwrap_or_else(|| self.items.iter().map(|line| line.quantity).sum());
        let price = self
            .total_price
            .unwrap_or_else(|| self.items.iter().map(CartLine::subtotal).sum());
        (quantity, price)
    }
}

/// Full replacement of a cart's lines. Lines left out are removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartUpdate {
    pub user: String,
    pub items: Vec<CartLine>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCartItem {
    pub product_id: String,
    pub variant_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    #[serde(default)]
    pub specific_address: String,
    #[serde(default)]
    pub address_detail: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub addresses: Vec<CustomerAddress>,
}

impl CustomerProfile {
    /// `"{specificAddress}, {addressDetail}"` of the address marked default.
    pub fn default_address(&self) -> Option<String> {
        self.addresses
            .iter()
            .find(|address| address.default)
            .map(|address| format!("{}, {}", address.specific_address, address.address_detail))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Buyer {
    pub name: String,
    pub phone: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub product: String,
    pub variant: String,
    pub quantity: u32,
    pub price: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub user: String,
    pub recipient: Recipient,
    pub buyer: Buyer,
    pub items: Vec<OrderItem>,
    pub total_price: i64,
    pub shipping_address: String,
    pub phone: String,
    pub customer_name: String,
    pub status: &'static str,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct CreatedOrder {
    #[serde(rename = "_id", deserialize_with = "id_ref")]
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReturnRequest<'a> {
    return_reason: &'a str,
}

pub struct BackendClient {
    client: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::with_base_url(&config.base_url, config.timeout_secs)
    }

    /// Builds a client rooted at `base_url`, which may carry a path prefix
    /// such as `/api/v1`.
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(USER_AGENT)
            .build()?;

        // Exactly one trailing slash, so joins append to the prefix instead of
        // replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| BackendError::InvalidUrl(format!("'{base_url}': {e}")))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST {base}/carts`. Succeeds only on 200 or 201.
    pub async fn add_to_cart(
        &self,
        request: &CartRequest,
        token: Option<&SecretString>,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("carts")?;
        let response = self.send(self.client.post(url).json(request), token).await?;
        accepted("carts", response).await.map(drop)
    }

    /// `GET {base}/carts`: the token holder's cart. `None` when the backend
    /// answers 404 or an empty `data`.
    pub async fn cart(&self, token: Option<&SecretString>) -> Result<Option<Cart>, BackendError> {
        let url = self.endpoint("carts")?;
        let response = self.send(self.client.get(url), token).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = accepted("carts", response).await?;
        data("carts", response).await
    }

    /// `PATCH {base}/carts/{cart_id}` with the complete new line list.
    pub async fn update_cart(
        &self,
        cart_id: &str,
        update: &CartUpdate,
        token: Option<&SecretString>,
    ) -> Result<(), BackendError> {
        let url = self.endpoint_with_id("carts", cart_id)?;
        let response = self.send(self.client.patch(url).json(update), token).await?;
        accepted("carts/{id}", response).await.map(drop)
    }

    /// `DELETE {base}/carts/remove-item` with the line to drop in the body.
    pub async fn remove_cart_item(
        &self,
        item: &RemoveCartItem,
        token: Option<&SecretString>,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("carts/remove-item")?;
        let response = self.send(self.client.delete(url).json(item), token).await?;
        accepted("carts/remove-item", response).await.map(drop)
    }

    /// `GET {base}/users/{user_id}`. `None` on 404.
    pub async fn customer(
        &self,
        user_id: &str,
        token: Option<&SecretString>,
    ) -> Result<Option<CustomerProfile>, BackendError> {
        let url = self.endpoint_with_id("users", user_id)?;
        let response = self.send(self.client.get(url), token).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = accepted("users/{id}", response).await?;
        data("users/{id}", response).await
    }

    /// `POST {base}/orders`. Returns the new order's id.
    pub async fn create_order(
        &self,
        order: &OrderRequest,
        token: Option<&SecretString>,
    ) -> Result<String, BackendError> {
        let url = self.endpoint("orders")?;
        let response = self.send(self.client.post(url).json(order), token).await?;
        let response = accepted("orders", response).await?;
        let created: Option<CreatedOrder> = data("orders", response).await?;
        created.map(|order| order.id).ok_or_else(|| BackendError::Decode {
            endpoint: "orders",
            message: "response carries no order id".to_string(),
        })
    }

    /// `PATCH {base}/orders/request-return/{order_id}`. The backend decides
    /// whether the order is eligible.
    pub async fn request_return(
        &self,
        order_id: &str,
        reason: &str,
        token: Option<&SecretString>,
    ) -> Result<(), BackendError> {
        let url = self.endpoint_with_id("orders/request-return", order_id)?;
        let body = ReturnRequest { return_reason: reason };
        let response = self.send(self.client.patch(url).json(&body), token).await?;
        accepted("orders/request-return/{id}", response).await.map(drop)
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        token: Option<&SecretString>,
    ) -> Result<Response, BackendError> {
        let builder = match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        };
        Ok(builder.send().await?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::InvalidUrl(format!("'{}{path}': {e}", self.base_url)))
    }

    /// `path` plus one percent-encoded id segment. Ids come from user input.
    fn endpoint_with_id(&self, path: &str, id: &str) -> Result<Url, BackendError> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(format!("'{}' cannot take a path", self.base_url)))?
            .push(id.trim());
        Ok(url)
    }
}

async fn accepted(endpoint: &'static str, response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status == StatusCode::OK || status == StatusCode::CREATED {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Rejected { endpoint, status: status.as_u16(), body })
}

async fn data<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<Option<T>, BackendError> {
    let body = response.bytes().await?;
    serde_json::from_slice::<Envelope<T>>(&body)
        .map(|envelope| envelope.data)
        .map_err(|error| BackendError::Decode { endpoint, message: error.to_string() })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{BackendClient, Cart, CustomerProfile};

    #[test]
    fn base_url_keeps_prefix_and_gains_one_slash() {
        for raw in ["http://localhost:8080/api/v1", "http://localhost:8080/api/v1//"] {
            let client = BackendClient::with_base_url(raw, 10).expect("client");
            assert_eq!(client.base_url().as_str(), "http://localhost:8080/api/v1/");
            assert_eq!(
                client.endpoint("carts").expect("endpoint").as_str(),
                "http://localhost:8080/api/v1/carts"
            );
        }
    }

    #[test]
    fn id_segments_are_percent_encoded() {
        let client = BackendClient::with_base_url("http://localhost:8080/api/v1", 10).expect("client");

        assert_eq!(
            client.endpoint_with_id("orders/request-return", " #A1 ?x ").expect("endpoint").as_str(),
            "http://localhost:8080/api/v1/orders/request-return/%23A1%20%3Fx"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(BackendClient::with_base_url("not a url", 10).is_err());
    }

    #[test]
    fn cart_accepts_plain_and_populated_references() {
        let cart: Cart = serde_json::from_value(json!({
            "_id": "cart-1",
            "items": [
                { "product": "p-1", "variant": { "_id": "v-1", "name": "128GB" }, "quantity": 2, "price": 100 },
                { "product": { "_id": "p-2" }, "variant": "v-2", "color": "Đen", "price": 50, "branch": { "_id": "b-1" } }
            ],
            "totalPrice": 250
        }))
        .expect("cart");

        assert_eq!(cart.items[0].variant, "v-1");
        assert_eq!(cart.items[1].product, "p-2");
        assert_eq!(cart.items[1].quantity, 1);
        assert_eq!(cart.items[1].branch.as_deref(), Some("b-1"));
        assert_eq!(cart.totals(), (3, 250));
        assert!(!cart.is_empty());
    }

    #[test]
    fn profile_default_address_joins_both_parts() {
        let profile: CustomerProfile = serde_json::from_value(json!({
            "name": "Lan",
            "addresses": [
                { "specificAddress": "1 Hai Bà Trưng", "addressDetail": "Quận 1", "default": false },
                { "specificAddress": "12 Lê Lợi", "addressDetail": "Quận 3, TP.HCM", "default": true }
            ]
        }))
        .expect("profile");

        assert_eq!(profile.default_address().as_deref(), Some("12 Lê Lợi, Quận 3, TP.HCM"));
        assert_eq!(CustomerProfile::default().default_address(), None);
    }
}
