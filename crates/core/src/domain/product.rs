use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attribute key under which products store their battery capacity string.
pub const BATTERY_CAPACITY_ATTRIBUTE: &str = "batteryCapacity";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BrandId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub brand_id: Option<BrandId>,
    /// Percent off the listed variant price, 0..=100.
    pub discount: u8,
    pub variant_ids: Vec<VariantId>,
    pub attributes: BTreeMap<String, String>,
    pub sold_count: u64,
    pub view_count: u64,
    pub average_rating: f64,
}

impl Product {
    pub fn battery_capacity(&self) -> Option<&str> {
        self.attributes
            .get(BATTERY_CAPACITY_ATTRIBUTE)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    pub ram: Option<String>,
    pub storage: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorOption {
    pub color_name: String,
    pub images: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    /// Owning product. Variants never outlive or move between products.
    pub product_id: ProductId,
    pub name: Option<String>,
    /// Listed price in VND, before the product discount.
    pub price: i64,
    pub memory: Memory,
    pub colors: Vec<ColorOption>,
}

impl Variant {
    pub fn has_color(&self, color: &str) -> bool {
        let wanted = color.trim().to_lowercase();
        self.colors.iter().any(|option| option.color_name.trim().to_lowercase() == wanted)
    }
}

/// A product shown under a brand, priced by its first variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandSample {
    pub name: String,
    pub price: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandSummary {
    pub brand: Brand,
    pub product_count: u64,
    pub samples: Vec<BrandSample>,
}

/// One surviving variant of a catalog search, flattened with the product-level
/// fields the reply needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub price: i64,
    pub discount: u8,
    pub memory: Memory,
    pub battery: Option<String>,
    pub images: Vec<String>,
    pub sold_count: u64,
    pub average_rating: f64,
}

impl VariantRecord {
    pub fn from_parts(product: &Product, variant: &Variant) -> Self {
        Self {
            variant_id: variant.id.clone(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            variant_name: variant.name.clone(),
            price: variant.price,
            discount: product.discount,
            memory: variant.memory.clone(),
            battery: product.battery_capacity().map(str::to_string),
            images: variant.colors.first().map(|color| color.images.clone()).unwrap_or_default(),
            sold_count: product.sold_count,
            average_rating: product.average_rating,
        }
    }
}
