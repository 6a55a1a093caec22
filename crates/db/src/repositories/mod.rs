use async_trait::async_trait;
use thiserror::Error;

use techshop_core::domain::product::{
    Brand, BrandId, BrandSummary, Category, CategoryId, Product, ProductId, Variant, VariantRecord,
};
use techshop_core::domain::promotion::Promotion;
use techshop_core::domain::store::{Branch, Inventory, WarrantyPolicy};
use techshop_core::search::{FilterSet, NameResolution, SearchPlan};

pub mod catalog;
pub mod memory;
pub mod store;

pub use catalog::SqlCatalogRepository;
pub use memory::{InMemoryCatalogRepository, InMemoryStoreRepository};
pub use store::SqlStoreRepository;

/// Number of products listed under a brand in its summary.
pub const BRAND_SAMPLE_SIZE: usize = 3;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Read access to the product catalog plus the writes used by seeding.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Category whose name matches `name` case-insensitively, preferring an
    /// exact match over a substring match.
    async fn resolve_category(&self, name: &str) -> Result<Option<CategoryId>, RepositoryError>;

    async fn resolve_brand(&self, name: &str) -> Result<Option<BrandId>, RepositoryError>;

    /// Variants admitted by `plan`, ordered by price in the plan's direction
    /// and capped at the plan's limit.
    async fn search(&self, plan: &SearchPlan) -> Result<Vec<VariantRecord>, RepositoryError>;

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn list_brands(&self) -> Result<Vec<Brand>, RepositoryError>;

    /// Brand looked up by its exact name, ignoring case.
    async fn brand_summary(&self, name: &str) -> Result<Option<BrandSummary>, RepositoryError>;

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, RepositoryError>;

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn variants_for_product(&self, id: &ProductId) -> Result<Vec<Variant>, RepositoryError>;

    async fn save_category(&self, category: Category) -> Result<(), RepositoryError>;

    async fn save_brand(&self, brand: Brand) -> Result<(), RepositoryError>;

    /// Replaces the product and its full variant list. Negative prices are
    /// rejected with [`RepositoryError::InvalidRecord`].
    async fn save_product(
        &self,
        product: Product,
        variants: Vec<Variant>,
    ) -> Result<(), RepositoryError>;

    /// Store ids for the category and brand names a filter set carries.
    async fn resolve_names(&self, filters: &FilterSet) -> Result<NameResolution, RepositoryError> {
        let category = match filters.category.as_deref() {
            Some(name) => self.resolve_category(name).await?,
            None => None,
        };
        let brand = match filters.brand.as_deref() {
            Some(name) => self.resolve_brand(name).await?,
            None => None,
        };
        Ok(NameResolution { category, brand })
    }
}

/// Stock, branches, warranty policies and promotions.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// `None` when the product has no stock lines at all.
    async fn inventory_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<Inventory>, RepositoryError>;

    async fn list_branches(&self) -> Result<Vec<Branch>, RepositoryError>;

    async fn list_warranty_policies(&self) -> Result<Vec<WarrantyPolicy>, RepositoryError>;

    async fn save_inventory(&self, inventory: Inventory) -> Result<(), RepositoryError>;

    async fn save_branch(&self, branch: Branch) -> Result<(), RepositoryError>;

    async fn save_warranty_policy(&self, policy: WarrantyPolicy) -> Result<(), RepositoryError>;

    /// Every promotion, running or not, ordered by end date then id.
    async fn list_promotions(&self) -> Result<Vec<Promotion>, RepositoryError>;

    async fn save_promotion(&self, promotion: Promotion) -> Result<(), RepositoryError>;
}

/// Picks the candidate whose name equals `query` ignoring case, otherwise the
/// first one whose name contains it. Candidates are expected in name order.
/// SQLite's `lower()` only folds ASCII, so Vietnamese names are compared here.
pub(crate) fn match_name<T>(
    candidates: impl IntoIterator<Item = (String, T)>,
    query: &str,
) -> Option<T> {
    let wanted = query.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    let mut first_partial = None;
    for (name, item) in candidates {
        let name = name.trim().to_lowercase();
        if name == wanted {
            return Some(item);
        }
        if first_partial.is_none() && name.contains(&wanted) {
            first_partial = Some(item);
        }
    }
    first_partial
}

/// Rejects a variant list with a negative price. Both stores call this before
/// writing so a product is either saved whole or not at all.
pub(crate) fn check_variant_prices(
    product: &Product,
    variants: &[Variant],
) -> Result<(), RepositoryError> {
    match variants.iter().find(|variant| variant.price < 0) {
        Some(variant) => Err(RepositoryError::InvalidRecord(format!(
            "variant `{}` of product `{}` has negative price {}",
            variant.id.0, product.id.0, variant.price
        ))),
        None => Ok(()),
    }
}

pub(crate) fn same_name(name: &str, query: &str) -> bool {
    name.trim().to_lowercase() == query.trim().to_lowercase()
}
