use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const DEMO_CATEGORY_IDS: &[&str] =
    &["cat-phone", "cat-laptop", "cat-tablet", "cat-accessory", "cat-watch"];

const DEMO_BRAND_IDS: &[&str] =
    &["brand-apple", "brand-samsung", "brand-xiaomi", "brand-asus", "brand-oppo"];

const DEMO_PRODUCT_IDS: &[&str] = &[
    "p-iphone-15",
    "p-galaxy-a55",
    "p-redmi-13c",
    "p-galaxy-s24-ultra",
    "p-xiaomi-14",
    "p-macbook-air-m3",
    "p-zenbook-14",
    "p-ipad-air-m2",
    "p-galaxy-buds3",
    "p-iphone-11",
];

const DEMO_BRANCH_IDS: &[&str] = &["branch-hcm-q1", "branch-hn-hk", "branch-dn"];

const DEMO_WARRANTY_IDS: &[&str] = &["warranty-standard", "warranty-exchange", "warranty-accessory"];

const DEMO_PROMOTION_IDS: &[&str] = &[
    "promo-techshop-member",
    "promo-phone-trade-in",
    "promo-laptop-tet",
    "promo-tablet-paused",
];

const EXPECTED_VARIANTS: i64 = 14;
const EXPECTED_PROMOTION_CATEGORIES: i64 = 3;
const EXPECTED_INVENTORY_LINES: i64 = 6;

/// Small Vietnamese electronics catalog covering every search dimension,
/// including unparseable spec strings and soft-deleted rows.
pub struct DemoCatalog;

impl DemoCatalog {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_catalog.sql");

    /// Replaces any earlier copy of the demo rows, so loading twice is safe.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        Self::clean(pool).await?;

        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            categories: DEMO_CATEGORY_IDS.len(),
            brands: DEMO_BRAND_IDS.len(),
            products: DEMO_PRODUCT_IDS.len(),
            variants: EXPECTED_VARIANTS as usize,
            promotions: DEMO_PROMOTION_IDS.len(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        checks.push(("categories", count_ids(pool, "category", DEMO_CATEGORY_IDS).await?));
        checks.push(("brands", count_ids(pool, "brand", DEMO_BRAND_IDS).await?));
        checks.push(("products", count_ids(pool, "product", DEMO_PRODUCT_IDS).await?));
        checks.push(("branches", count_ids(pool, "branch", DEMO_BRANCH_IDS).await?));
        checks.push((
            "warranty-policies",
            count_ids(pool, "warranty_policy", DEMO_WARRANTY_IDS).await?,
        ));
        checks.push(("promotions", count_ids(pool, "promotion", DEMO_PROMOTION_IDS).await?));

        let promotion_ids = sql_array_from_ids(DEMO_PROMOTION_IDS);
        let scoped: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM promotion_category WHERE promotion_id IN {promotion_ids}"
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("promotion-categories", scoped == EXPECTED_PROMOTION_CATEGORIES));

        let products = sql_array_from_ids(DEMO_PRODUCT_IDS);
        let variant_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM variant WHERE product_id IN {products}"
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("variants", variant_count == EXPECTED_VARIANTS));

        let inventory_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM inventory_line WHERE product_id IN {products}"
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("inventory-lines", inventory_count == EXPECTED_INVENTORY_LINES));

        let orphan_variants: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM variant v LEFT JOIN product p ON p.id = v.product_id
             WHERE p.id IS NULL",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("variants-have-products", orphan_variants == 0));

        let terabyte_parsed: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM variant WHERE id = 'v-galaxy-s24-ultra-1tb' AND storage_gb = 1024)",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("terabyte-storage-normalized", terabyte_parsed == 1));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        let products = sql_array_from_ids(DEMO_PRODUCT_IDS);
        let categories = sql_array_from_ids(DEMO_CATEGORY_IDS);
        let brands = sql_array_from_ids(DEMO_BRAND_IDS);
        let branches = sql_array_from_ids(DEMO_BRANCH_IDS);
        let warranties = sql_array_from_ids(DEMO_WARRANTY_IDS);
        let promotions = sql_array_from_ids(DEMO_PROMOTION_IDS);

        for statement in [
            format!("DELETE FROM promotion_category WHERE promotion_id IN {promotions}"),
            format!("DELETE FROM promotion WHERE id IN {promotions}"),
            format!("DELETE FROM inventory_line WHERE product_id IN {products}"),
            format!("DELETE FROM variant WHERE product_id IN {products}"),
            format!("DELETE FROM product WHERE id IN {products}"),
            format!("DELETE FROM category WHERE id IN {categories}"),
            format!("DELETE FROM brand WHERE id IN {brands}"),
            format!("DELETE FROM branch WHERE id IN {branches}"),
            format!("DELETE FROM warranty_policy WHERE id IN {warranties}"),
        ] {
            sqlx::query(&statement).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn count_ids(
    pool: &DbPool,
    table: &str,
    ids: &[&str],
) -> Result<bool, RepositoryError> {
    let quoted = sql_array_from_ids(ids);
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {table} WHERE id IN {quoted}"))
        .fetch_one(pool)
        .await?;
    Ok(count == ids.len() as i64)
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    pub categories: usize,
    pub brands: usize,
    pub products: usize,
    pub variants: usize,
    pub promotions: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!DemoCatalog::SQL.is_empty());
        for id in DEMO_PRODUCT_IDS {
            assert!(DemoCatalog::SQL.contains(&format!("('{id}'")), "missing product {id}");
        }
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");

        let first = DemoCatalog::load(&pool).await.expect("load demo catalog");
        let first_verification = DemoCatalog::verify(&pool).await.expect("verify demo catalog");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);

        let second = DemoCatalog::load(&pool).await.expect("reload demo catalog");
        let second_verification = DemoCatalog::verify(&pool).await.expect("re-verify");
        assert!(second_verification.all_present);
        assert_eq!(first, second);
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn clean_removes_every_demo_row() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoCatalog::load(&pool).await.expect("load demo catalog");

        DemoCatalog::clean(&pool).await.expect("clean demo catalog");

        let remaining: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(1) FROM product) + (SELECT COUNT(1) FROM variant)
                  + (SELECT COUNT(1) FROM category) + (SELECT COUNT(1) FROM inventory_line)
                  + (SELECT COUNT(1) FROM promotion) + (SELECT COUNT(1) FROM promotion_category)",
        )
        .fetch_one(&pool)
        .await
        .expect("count rows");
        assert_eq!(remaining, 0);
    }
}
