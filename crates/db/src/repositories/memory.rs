use std::collections::BTreeMap;

use tokio::sync::RwLock;

use techshop_core::domain::product::{
    Brand, BrandId, BrandSample, BrandSummary, Category, CategoryId, Product, ProductId, Variant,
    VariantRecord,
};
use techshop_core::domain::promotion::Promotion;
use techshop_core::domain::store::{Branch, Inventory, WarrantyPolicy};
use techshop_core::search::{PriceOrder, SearchPlan, VariantMetrics};

use super::{
    check_variant_prices, match_name, same_name, CatalogRepository, RepositoryError,
    StoreRepository, BRAND_SAMPLE_SIZE,
};

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    categories: RwLock<BTreeMap<String, Category>>,
    brands: RwLock<BTreeMap<String, Brand>>,
    products: RwLock<BTreeMap<String, (Product, Vec<Variant>)>>,
}

fn by_name<'a, T: 'a>(
    items: impl Iterator<Item = &'a T>,
    name: impl Fn(&T) -> &str,
) -> Vec<&'a T> {
    let mut items: Vec<&T> = items.collect();
    items.sort_by(|left, right| name(left).cmp(name(right)));
    items
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn resolve_category(&self, name: &str) -> Result<Option<CategoryId>, RepositoryError> {
        let categories = self.categories.read().await;
        let candidates = by_name(categories.values(), |category| category.name.as_str())
            .into_iter()
            .map(|category| (category.name.clone(), category.id.clone()));
        Ok(match_name(candidates, name))
    }

    async fn resolve_brand(&self, name: &str) -> Result<Option<BrandId>, RepositoryError> {
        let brands = self.brands.read().await;
        let candidates = by_name(brands.values(), |brand| brand.name.as_str())
            .into_iter()
            .map(|brand| (brand.name.clone(), brand.id.clone()));
        Ok(match_name(candidates, name))
    }

    async fn search(&self, plan: &SearchPlan) -> Result<Vec<VariantRecord>, RepositoryError> {
        let products = self.products.read().await;

        let mut records: Vec<VariantRecord> = products
            .values()
            .filter(|(product, _)| plan.matches_product(product))
            .flat_map(|(product, variants)| {
                variants
                    .iter()
                    .filter(move |variant| plan.admits(&VariantMetrics::from_parts(product, variant)))
                    .map(move |variant| VariantRecord::from_parts(product, variant))
            })
            .collect();

        records.sort_by(|left, right| {
            let by_price = match plan.order() {
                PriceOrder::Ascending => left.price.cmp(&right.price),
                PriceOrder::Descending => right.price.cmp(&left.price),
            };
            by_price.then_with(|| left.variant_id.cmp(&right.variant_id))
        });
        records.truncate(plan.limit());
        Ok(records)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = self.categories.read().await;
        Ok(by_name(categories.values(), |category| category.name.as_str())
            .into_iter()
            .cloned()
            .collect())
    }

    async fn list_brands(&self) -> Result<Vec<Brand>, RepositoryError> {
        let brands = self.brands.read().await;
        Ok(by_name(brands.values(), |brand| brand.name.as_str()).into_iter().cloned().collect())
    }

    async fn brand_summary(&self, name: &str) -> Result<Option<BrandSummary>, RepositoryError> {
        let brand = self.list_brands().await?.into_iter().find(|brand| same_name(&brand.name, name));
        let Some(brand) = brand else {
            return Ok(None);
        };

        let products = self.products.read().await;
        let owned: Vec<&(Product, Vec<Variant>)> = products
            .values()
            .filter(|(product, _)| product.brand_id.as_ref() == Some(&brand.id))
            .collect();

        Ok(Some(BrandSummary {
            product_count: owned.len() as u64,
            samples: owned
                .iter()
                .take(BRAND_SAMPLE_SIZE)
                .map(|(product, variants)| BrandSample {
                    name: product.name.clone(),
                    price: variants.first().map(|variant| variant.price),
                })
                .collect(),
            brand,
        }))
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        let candidates = by_name(products.values(), |(product, _)| product.name.as_str())
            .into_iter()
            .map(|(product, _)| (product.name.clone(), product.clone()));
        Ok(match_name(candidates, name))
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).map(|(product, _)| product.clone()))
    }

    async fn variants_for_product(&self, id: &ProductId) -> Result<Vec<Variant>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).map(|(_, variants)| variants.clone()).unwrap_or_default())
    }

    async fn save_category(&self, category: Category) -> Result<(), RepositoryError> {
        let mut categories = self.categories.write().await;
        categories.insert(category.id.0.clone(), category);
        Ok(())
    }

    async fn save_brand(&self, brand: Brand) -> Result<(), RepositoryError> {
        let mut brands = self.brands.write().await;
        brands.insert(brand.id.0.clone(), brand);
        Ok(())
    }

    async fn save_product(
        &self,
        mut product: Product,
        variants: Vec<Variant>,
    ) -> Result<(), RepositoryError> {
        check_variant_prices(&product, &variants)?;
        product.variant_ids = variants.iter().map(|variant| variant.id.clone()).collect();
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), (product, variants));
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryStoreRepository {
    inventories: RwLock<BTreeMap<String, Inventory>>,
    branches: RwLock<BTreeMap<String, Branch>>,
    policies: RwLock<BTreeMap<String, WarrantyPolicy>>,
    promotions: RwLock<BTreeMap<String, Promotion>>,
}

#[async_trait::async_trait]
impl StoreRepository for InMemoryStoreRepository {
    async fn inventory_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<Inventory>, RepositoryError> {
        let inventories = self.inventories.read().await;
        Ok(inventories.get(&product_id.0).filter(|inventory| !inventory.lines.is_empty()).cloned())
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, RepositoryError> {
        let branches = self.branches.read().await;
        Ok(by_name(branches.values(), |branch| branch.name.as_str()).into_iter().cloned().collect())
    }

    async fn list_warranty_policies(&self) -> Result<Vec<WarrantyPolicy>, RepositoryError> {
        let policies = self.policies.read().await;
        Ok(by_name(policies.values(), |policy| policy.name.as_str()).into_iter().cloned().collect())
    }

    async fn save_inventory(&self, inventory: Inventory) -> Result<(), RepositoryError> {
        let mut inventories = self.inventories.write().await;
        inventories.insert(inventory.product_id.0.clone(), inventory);
        Ok(())
    }

    async fn save_branch(&self, branch: Branch) -> Result<(), RepositoryError> {
        let mut branches = self.branches.write().await;
        branches.insert(branch.id.clone(), branch);
        Ok(())
    }

    async fn save_warranty_policy(&self, policy: WarrantyPolicy) -> Result<(), RepositoryError> {
        let mut policies = self.policies.write().await;
        policies.insert(policy.id.clone(), policy);
        Ok(())
    }

    async fn list_promotions(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let promotions = self.promotions.read().await;
        let mut listed: Vec<Promotion> = promotions.values().cloned().collect();
        listed.sort_by(|left, right| {
            left.ends_at.cmp(&right.ends_at).then_with(|| left.id.cmp(&right.id))
        });
        Ok(listed)
    }

    async fn save_promotion(&self, promotion: Promotion) -> Result<(), RepositoryError> {
        let mut promotions = self.promotions.write().await;
        promotions.insert(promotion.id.clone(), promotion);
        Ok(())
    }
}
