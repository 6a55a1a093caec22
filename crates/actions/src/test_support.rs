use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use techshop_core::domain::product::{
    Brand, BrandId, Category, CategoryId, ColorOption, Memory, Product, ProductId, Variant,
    VariantId, BATTERY_CAPACITY_ATTRIBUTE,
};
use techshop_core::domain::store::{Branch, Inventory, StockLine};
use techshop_core::render::{RenderSettings, ReplyFormat, ReplyRenderer};
use techshop_db::{CatalogRepository, InMemoryCatalogRepository, InMemoryStoreRepository, StoreRepository};

pub(crate) fn text_renderer() -> Arc<ReplyRenderer> {
    let settings = RenderSettings { format: ReplyFormat::Text, ..RenderSettings::default() };
    Arc::new(ReplyRenderer::new(settings).expect("renderer"))
}

fn variant(product: &str, id: &str, name: &str, price: i64, memory: (&str, &str), colors: &[&str]) -> Variant {
    Variant {
        id: VariantId(id.to_string()),
        product_id: ProductId(product.to_string()),
        name: Some(name.to_string()),
        price,
        memory: Memory { ram: Some(memory.0.to_string()), storage: Some(memory.1.to_string()) },
        colors: colors
            .iter()
            .map(|color| ColorOption { color_name: color.to_string(), images: vec![] })
            .collect(),
    }
}

fn phone(id: &str, name: &str, brand: &str, discount: u8, battery: &str) -> Product {
    Product {
        id: ProductId(id.to_string()),
        name: name.to_string(),
        description: None,
        category_id: Some(CategoryId("cat-phone".to_string())),
        brand_id: Some(BrandId(brand.to_string())),
        discount,
        variant_ids: vec![],
        attributes: BTreeMap::from([(BATTERY_CAPACITY_ATTRIBUTE.to_string(), battery.to_string())]),
        sold_count: 10,
        view_count: 100,
        average_rating: 4.5,
    }
}

pub(crate) async fn demo_catalog() -> Arc<InMemoryCatalogRepository> {
    let repo = InMemoryCatalogRepository::default();
    for (id, name) in [("cat-phone", "Điện thoại"), ("cat-laptop", "Laptop")] {
        repo.save_category(Category { id: CategoryId(id.to_string()), name: name.to_string(), description: None })
            .await
            .expect("save category");
    }
    for (id, name) in [("brand-apple", "Apple"), ("brand-samsung", "Samsung"), ("brand-oppo", "OPPO")] {
        repo.save_brand(Brand {
            id: BrandId(id.to_string()),
            name: name.to_string(),
            description: Some(format!("Thương hiệu {name}")),
            logo_url: None,
        })
        .await
        .expect("save brand");
    }

    repo.save_product(
        phone("p-iphone-15", "iPhone 15", "brand-apple", 0, "3349 mAh"),
        vec![
            variant("p-iphone-15", "v-ip15-128", "128GB", 19_990_000, ("6 GB", "128 GB"), &["Hồng", "Đen"]),
            variant("p-iphone-15", "v-ip15-256", "256GB", 22_990_000, ("6 GB", "256 GB"), &["Hồng"]),
        ],
    )
    .await
    .expect("save iphone");
    repo.save_product(
        phone("p-galaxy-a55", "Galaxy A55", "brand-samsung", 10, "5000 mAh"),
        vec![variant("p-galaxy-a55", "v-a55", "8GB/128GB", 9_990_000, ("8 GB", "128 GB"), &["Xanh"])],
    )
    .await
    .expect("save a55");
    repo.save_product(
        phone("p-galaxy-a05", "Galaxy A05", "brand-samsung", 0, "5000 mAh"),
        vec![variant("p-galaxy-a05", "v-a05", "4GB/64GB", 3_490_000, ("4 GB", "64 GB"), &["Đen"])],
    )
    .await
    .expect("save a05");

    Arc::new(repo)
}

pub(crate) async fn demo_store() -> Arc<InMemoryStoreRepository> {
    let repo = InMemoryStoreRepository::default();
    repo.save_inventory(Inventory {
        product_id: ProductId("p-iphone-15".to_string()),
        lines: vec![
            StockLine { variant_color: "128GB - Hồng".to_string(), stock: 5 },
            StockLine { variant_color: "128GB - Đen".to_string(), stock: 0 },
        ],
    })
    .await
    .expect("save inventory");
    repo.save_branch(Branch {
        id: "branch-hcm".to_string(),
        name: "TechShop Quận 1".to_string(),
        phone: Some("028 3822 0000".to_string()),
        email: None,
        address: Some("12 Lê Lợi, Quận 1".to_string()),
    })
    .await
    .expect("save branch");
    Arc::new(repo)
}

/// Backend answering `GET /carts` with two lines: 2 × iPhone 15 128GB and
/// 1 × Galaxy A55, plus a line whose product no longer exists.
pub(crate) async fn backend_with_cart() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/carts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "_id": "cart-7",
                "items": [
                    { "product": "p-gone", "variant": "v-gone", "color": "Bạc", "quantity": 1, "price": 1000000, "branch": "branch-hcm" },
                    { "product": { "_id": "p-iphone-15" }, "variant": "v-ip15-128", "color": "Hồng", "quantity": 2, "price": 19990000, "branch": "branch-hcm" },
                    { "product": "p-galaxy-a55", "variant": "v-a55", "color": "Xanh", "quantity": 1, "price": 9990000, "branch": "branch-hcm" }
                ],
                "totalPrice": 50970000,
                "totalQuantity": 4
            }
        })))
        .mount(&server)
        .await;
    server
}
