use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use serde::Deserialize;

use techshop_core::domain::product::BATTERY_CAPACITY_ATTRIBUTE;
use techshop_core::search::numeric::{extract_number, parse_storage_gb};
use techshop_core::search::{FilterResolver, PlanError, PlanOptions, SearchPlan, SlotInput};
use techshop_db::repositories::{
    CatalogRepository, SqlCatalogRepository, SqlStoreRepository, StoreRepository,
};
use techshop_db::{connect_with_settings, migrations, DemoCatalog};

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
    ($left:expr, $right:expr, $($arg:tt)*) => {
        if $left != $right {
            return Err(format!($($arg)*));
        }
    };
}

#[derive(Debug, Deserialize)]
struct CategoryContract {
    id: String,
    name: String,
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct BrandContract {
    id: String,
    name: String,
    product_count: u64,
}

#[derive(Debug, Deserialize)]
struct VariantContract {
    id: String,
    ram: Option<String>,
    storage: Option<String>,
    ram_gb: Option<u64>,
    storage_gb: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProductContract {
    id: String,
    battery: Option<String>,
    battery_mah: Option<u64>,
    deleted: bool,
    variants: Vec<VariantContract>,
}

#[derive(Debug, Deserialize)]
struct PromotionContract {
    id: String,
    value_type: String,
    value: i64,
    categories: Vec<String>,
    running: bool,
}

#[derive(Debug, Deserialize)]
struct SearchScenario {
    name: String,
    slots: BTreeMap<String, String>,
    expected_variant_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogContract {
    dataset: String,
    categories: Vec<CategoryContract>,
    brands: Vec<BrandContract>,
    products: Vec<ProductContract>,
    promotions: Vec<PromotionContract>,
    search_scenarios: Vec<SearchScenario>,
}

fn contract() -> SeedContractTestResult<CatalogContract> {
    serde_json::from_str(include_str!("../../../config/fixtures/demo_catalog_contract.json"))
        .map_err(|error| format!("demo catalog contract JSON must parse: {error}"))
}

#[test]
fn derived_columns_agree_with_numeric_parsers() -> SeedContractTestResult {
    let contract = contract()?;
    let fixture_sql = DemoCatalog::SQL;

    require_eq!(contract.dataset, "techshop_demo_catalog");

    let mut variant_ids = HashSet::new();
    for product in &contract.products {
        require!(
            fixture_sql.contains(&format!("('{}'", product.id)),
            "fixture SQL should insert product {}",
            product.id
        );
        require_eq!(
            product.battery.as_deref().and_then(extract_number),
            product.battery_mah,
            "battery_mah for {} should match its battery string",
            product.id
        );
        if let Some(battery) = &product.battery {
            require!(
                fixture_sql
                    .contains(&format!("\"{BATTERY_CAPACITY_ATTRIBUTE}\":\"{battery}\"")),
                "fixture SQL should carry battery {} for {}",
                battery,
                product.id
            );
        }

        for variant in &product.variants {
            require!(variant_ids.insert(variant.id.clone()), "duplicate variant {}", variant.id);
            require_eq!(
                variant.ram.as_deref().and_then(extract_number),
                variant.ram_gb,
                "ram_gb for {} should match {:?}",
                variant.id,
                variant.ram
            );
            require_eq!(
                variant.storage.as_deref().and_then(parse_storage_gb),
                variant.storage_gb,
                "storage_gb for {} should match {:?}",
                variant.id,
                variant.storage
            );
            require!(
                fixture_sql.contains(&format!("('{}', '{}'", variant.id, product.id)),
                "fixture SQL should insert variant {} under {}",
                variant.id,
                product.id
            );
        }
    }

    require!(
        contract.products.iter().any(|product| product.deleted),
        "contract should include a soft-deleted product"
    );
    require!(
        contract.categories.iter().any(|category| category.deleted),
        "contract should include a soft-deleted category"
    );
    Ok(())
}

#[tokio::test]
async fn seeded_catalog_answers_every_search_scenario() -> SeedContractTestResult {
    let contract = contract()?;
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    DemoCatalog::load(&pool).await.map_err(|error| format!("seed: {error}"))?;

    let repo = SqlCatalogRepository::new(pool);
    let resolver = FilterResolver::default();

    for scenario in &contract.search_scenarios {
        let slots = SlotInput::from_slots(|name| scenario.slots.get(name).cloned());
        let filters = resolver.resolve(&slots);
        let resolution = repo
            .resolve_names(&filters)
            .await
            .map_err(|error| format!("{}: resolve names: {error}", scenario.name))?;

        let plan = match SearchPlan::from_filters(&filters, &resolution, &PlanOptions::default()) {
            Ok(plan) => plan,
            Err(PlanError::BrandNotFound { .. }) if scenario.expected_variant_ids.is_empty() => {
                continue
            }
            Err(error) => return Err(format!("{}: plan: {error}", scenario.name)),
        };

        let found: Vec<String> = repo
            .search(&plan)
            .await
            .map_err(|error| format!("{}: search: {error}", scenario.name))?
            .into_iter()
            .map(|record| record.variant_id.0)
            .collect();

        require_eq!(
            found,
            scenario.expected_variant_ids,
            "scenario {} returned {:?}, expected {:?}",
            scenario.name,
            found,
            scenario.expected_variant_ids
        );
    }
    Ok(())
}

#[tokio::test]
async fn listings_hide_deleted_rows_and_count_brand_products() -> SeedContractTestResult {
    let contract = contract()?;
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    DemoCatalog::load(&pool).await.map_err(|error| format!("seed: {error}"))?;
    let repo = SqlCatalogRepository::new(pool);

    let listed: HashSet<String> = repo
        .list_categories()
        .await
        .map_err(|error| format!("list categories: {error}"))?
        .into_iter()
        .map(|category| category.id.0)
        .collect();
    for category in &contract.categories {
        require_eq!(
            listed.contains(&category.id),
            !category.deleted,
            "category {} ({}) listing should follow its deleted flag",
            category.id,
            category.name
        );
    }

    for brand in &contract.brands {
        let summary = repo
            .brand_summary(&brand.name.to_uppercase())
            .await
            .map_err(|error| format!("brand summary: {error}"))?
            .ok_or_else(|| format!("brand {} should resolve by exact name", brand.name))?;
        require_eq!(summary.brand.id.0, brand.id);
        require_eq!(
            summary.product_count,
            brand.product_count,
            "brand {} should own {} live products",
            brand.name,
            brand.product_count
        );
        require!(summary.samples.len() as u64 <= brand.product_count.min(3));
    }

    let retired = repo
        .find_product_by_name("iPhone 11")
        .await
        .map_err(|error| format!("find product: {error}"))?;
    require!(retired.is_none(), "soft-deleted products should not be found by name");
    Ok(())
}

#[tokio::test]
async fn seeded_promotions_match_their_windows_and_scopes() -> SeedContractTestResult {
    let contract = contract()?;
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    migrations::run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    DemoCatalog::load(&pool).await.map_err(|error| format!("seed: {error}"))?;
    let store = SqlStoreRepository::new(pool);

    let promotions = store.list_promotions().await.map_err(|error| format!("list: {error}"))?;
    require_eq!(promotions.len(), contract.promotions.len());

    let now = Utc::now();
    for expected in &contract.promotions {
        let promotion = promotions
            .iter()
            .find(|promotion| promotion.id == expected.id)
            .ok_or_else(|| format!("promotion {} should be seeded", expected.id))?;
        require_eq!(promotion.value.kind(), expected.value_type.as_str());
        require_eq!(promotion.value.amount(), expected.value);
        let categories: Vec<&str> =
            promotion.category_ids.iter().map(|category| category.0.as_str()).collect();
        require_eq!(categories, expected.categories, "categories of {}", expected.id);
        require_eq!(
            promotion.is_running(now),
            expected.running,
            "promotion {} running state",
            expected.id
        );
    }
    Ok(())
}
