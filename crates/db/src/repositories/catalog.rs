use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use techshop_core::domain::product::{
    Brand, BrandId, BrandSample, BrandSummary, Category, CategoryId, ColorOption, Memory, Product,
    ProductId, Variant, VariantId, VariantRecord, BATTERY_CAPACITY_ATTRIBUTE,
};
use techshop_core::search::numeric::extract_number;
use techshop_core::search::{Bound, Dimension, PriceOrder, SearchPlan, UnparsedSpec, VariantMetrics};

use super::{
    check_variant_prices, match_name, same_name, CatalogRepository, RepositoryError,
    BRAND_SAMPLE_SIZE,
};
use crate::DbPool;

const SEARCH_SELECT: &str = r#"
    SELECT v.id AS variant_id, p.id AS product_id, p.name AS product_name,
           v.name AS variant_name, v.price, p.discount, v.ram, v.storage,
           p.attributes_json, v.colors_json, p.sold_count, p.average_rating
    FROM product p
    JOIN variant v ON v.product_id = p.id
"#;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn product_by_id(&self, id: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, description, category_id, brand_id, discount, attributes_json,
                    sold_count, view_count, average_rating
             FROM product WHERE id = ? AND is_deleted = 0",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let variant_ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM variant WHERE product_id = ? ORDER BY position, id")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        row_to_product(&row, variant_ids.into_iter().map(VariantId).collect()).map(Some)
    }
}

/// The search plan rendered as one SQL statement. Numeric bounds compare the
/// parsed columns; how a NULL (unparseable) column is treated follows the
/// plan's [`UnparsedSpec`].
pub fn search_query(plan: &SearchPlan) -> QueryBuilder<'static, Sqlite> {
    let mut query_builder = QueryBuilder::new(SEARCH_SELECT);
    query_builder.push(" WHERE p.is_deleted = 0");

    if let Some(CategoryId(id)) = plan.category() {
        query_builder.push(" AND p.category_id = ");
        query_builder.push_bind(id.clone());
    }
    if let Some(BrandId(id)) = plan.brand() {
        query_builder.push(" AND p.brand_id = ");
        query_builder.push_bind(id.clone());
    }

    for (dimension, bound) in plan.bounds() {
        let column = bound_column(dimension);
        let operator = match bound {
            Bound::AtLeast(_) => ">=",
            Bound::AtMost(_) => "<=",
        };
        let value = i64::try_from(bound.value()).unwrap_or(i64::MAX);

        match plan.unparsed() {
            UnparsedSpec::Exclude => {
                query_builder.push(format!(" AND {column} {operator} "));
                query_builder.push_bind(value);
            }
            UnparsedSpec::Include => {
                query_builder.push(format!(" AND ({column} IS NULL OR {column} {operator} "));
                query_builder.push_bind(value);
                query_builder.push(")");
            }
            UnparsedSpec::TreatAsZero => {
                query_builder.push(format!(" AND COALESCE({column}, 0) {operator} "));
                query_builder.push_bind(value);
            }
        }
    }

    let direction = match plan.order() {
        PriceOrder::Ascending => "ASC",
        PriceOrder::Descending => "DESC",
    };
    query_builder.push(format!(" ORDER BY v.price {direction}, v.id ASC LIMIT "));
    query_builder.push_bind(i64::try_from(plan.limit()).unwrap_or(i64::MAX));
    query_builder
}

fn bound_column(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Price => "v.price",
        Dimension::Ram => "v.ram_gb",
        Dimension::Storage => "v.storage_gb",
        Dimension::Battery => "p.battery_mah",
    }
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn json_column<T: DeserializeOwned>(row: &SqliteRow, name: &str) -> Result<T, RepositoryError> {
    let raw: String = column(row, name)?;
    serde_json::from_str(&raw).map_err(|e| RepositoryError::Decode(format!("{name}: {e}")))
}

fn count_column(row: &SqliteRow, name: &str) -> Result<u64, RepositoryError> {
    let value: i64 = column(row, name)?;
    Ok(u64::try_from(value).unwrap_or_default())
}

fn discount_column(row: &SqliteRow) -> Result<u8, RepositoryError> {
    let value: i64 = column(row, "discount")?;
    Ok(u8::try_from(value.clamp(0, 100)).unwrap_or_default())
}

fn row_to_record(row: &SqliteRow) -> Result<VariantRecord, RepositoryError> {
    let attributes: BTreeMap<String, String> = json_column(row, "attributes_json")?;
    let colors: Vec<ColorOption> = json_column(row, "colors_json")?;

    Ok(VariantRecord {
        variant_id: VariantId(column(row, "variant_id")?),
        product_id: ProductId(column(row, "product_id")?),
        product_name: column(row, "product_name")?,
        variant_name: column(row, "variant_name")?,
        price: column(row, "price")?,
        discount: discount_column(row)?,
        memory: Memory { ram: column(row, "ram")?, storage: column(row, "storage")? },
        battery: attributes
            .get(BATTERY_CAPACITY_ATTRIBUTE)
            .filter(|value| !value.trim().is_empty())
            .cloned(),
        images: colors.into_iter().next().map(|color| color.images).unwrap_or_default(),
        sold_count: count_column(row, "sold_count")?,
        average_rating: column(row, "average_rating")?,
    })
}

fn row_to_product(row: &SqliteRow, variant_ids: Vec<VariantId>) -> Result<Product, RepositoryError> {
    let category_id: Option<String> = column(row, "category_id")?;
    let brand_id: Option<String> = column(row, "brand_id")?;

    Ok(Product {
        id: ProductId(column(row, "id")?),
        name: column(row, "name")?,
        description: column(row, "description")?,
        category_id: category_id.map(CategoryId),
        brand_id: brand_id.map(BrandId),
        discount: discount_column(row)?,
        variant_ids,
        attributes: json_column(row, "attributes_json")?,
        sold_count: count_column(row, "sold_count")?,
        view_count: count_column(row, "view_count")?,
        average_rating: column(row, "average_rating")?,
    })
}

fn row_to_variant(row: &SqliteRow) -> Result<Variant, RepositoryError> {
    Ok(Variant {
        id: VariantId(column(row, "id")?),
        product_id: ProductId(column(row, "product_id")?),
        name: column(row, "name")?,
        price: column(row, "price")?,
        memory: Memory { ram: column(row, "ram")?, storage: column(row, "storage")? },
        colors: json_column(row, "colors_json")?,
    })
}

fn row_to_brand(row: &SqliteRow) -> Result<Brand, RepositoryError> {
    Ok(Brand {
        id: BrandId(column(row, "id")?),
        name: column(row, "name")?,
        description: column(row, "description")?,
        logo_url: column(row, "logo_url")?,
    })
}

fn to_json(value: &impl serde::Serialize) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn to_sql_int(value: Option<u64>) -> Option<i64> {
    value.and_then(|value| i64::try_from(value).ok())
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn resolve_category(&self, name: &str) -> Result<Option<CategoryId>, RepositoryError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT name, id FROM category WHERE is_deleted = 0 ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(match_name(rows, name).map(CategoryId))
    }

    async fn resolve_brand(&self, name: &str) -> Result<Option<BrandId>, RepositoryError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT name, id FROM brand WHERE is_deleted = 0 ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;

        Ok(match_name(rows, name).map(BrandId))
    }

    async fn search(&self, plan: &SearchPlan) -> Result<Vec<VariantRecord>, RepositoryError> {
        let mut query = search_query(plan);
        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, description FROM category WHERE is_deleted = 0 ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Category {
                    id: CategoryId(column(row, "id")?),
                    name: column(row, "name")?,
                    description: column(row, "description")?,
                })
            })
            .collect()
    }

    async fn list_brands(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, description, logo_url FROM brand
             WHERE is_deleted = 0 ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_brand).collect()
    }

    async fn brand_summary(&self, name: &str) -> Result<Option<BrandSummary>, RepositoryError> {
        let brand = self.list_brands().await?.into_iter().find(|brand| same_name(&brand.name, name));
        let Some(brand) = brand else {
            return Ok(None);
        };

        let product_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM product WHERE brand_id = ? AND is_deleted = 0",
        )
        .bind(&brand.id.0)
        .fetch_one(&self.pool)
        .await?;

        let samples: Vec<(String, Option<i64>)> = sqlx::query_as(
            "SELECT p.name,
                    (SELECT v.price FROM variant v
                     WHERE v.product_id = p.id
                     ORDER BY v.position, v.id LIMIT 1) AS price
             FROM product p
             WHERE p.brand_id = ? AND p.is_deleted = 0
             ORDER BY p.created_at, p.id
             LIMIT ?",
        )
        .bind(&brand.id.0)
        .bind(BRAND_SAMPLE_SIZE as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(BrandSummary {
            brand,
            product_count: u64::try_from(product_count).unwrap_or_default(),
            samples: samples.into_iter().map(|(name, price)| BrandSample { name, price }).collect(),
        }))
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, RepositoryError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT name, id FROM product WHERE is_deleted = 0 ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        match match_name(rows, name) {
            Some(id) => self.product_by_id(&id).await,
            None => Ok(None),
        }
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.product_by_id(&id.0).await
    }

    async fn variants_for_product(&self, id: &ProductId) -> Result<Vec<Variant>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, product_id, name, price, ram, storage, colors_json
             FROM variant WHERE product_id = ? ORDER BY position, id",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_variant).collect()
    }

    async fn save_category(&self, category: Category) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO category (id, name, description) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description",
        )
        .bind(&category.id.0)
        .bind(&category.name)
        .bind(&category.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_brand(&self, brand: Brand) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO brand (id, name, description, logo_url) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 logo_url = excluded.logo_url",
        )
        .bind(&brand.id.0)
        .bind(&brand.name)
        .bind(&brand.description)
        .bind(&brand.logo_url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_product(
        &self,
        product: Product,
        variants: Vec<Variant>,
    ) -> Result<(), RepositoryError> {
        check_variant_prices(&product, &variants)?;
        let attributes_json = to_json(&product.attributes)?;
        let battery_mah = to_sql_int(product.battery_capacity().and_then(extract_number));

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO product (id, name, description, category_id, brand_id, discount,
                                  attributes_json, battery_mah, sold_count, view_count,
                                  average_rating)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 category_id = excluded.category_id,
                 brand_id = excluded.brand_id,
                 discount = excluded.discount,
                 attributes_json = excluded.attributes_json,
                 battery_mah = excluded.battery_mah,
                 sold_count = excluded.sold_count,
                 view_count = excluded.view_count,
                 average_rating = excluded.average_rating",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id.as_ref().map(|id| id.0.as_str()))
        .bind(product.brand_id.as_ref().map(|id| id.0.as_str()))
        .bind(i64::from(product.discount.min(100)))
        .bind(&attributes_json)
        .bind(battery_mah)
        .bind(to_sql_int(Some(product.sold_count)))
        .bind(to_sql_int(Some(product.view_count)))
        .bind(product.average_rating)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM variant WHERE product_id = ?")
            .bind(&product.id.0)
            .execute(&mut *tx)
            .await?;

        for (position, variant) in variants.iter().enumerate() {
            let metrics = VariantMetrics::from_parts(&product, variant);
            sqlx::query(
                "INSERT INTO variant (id, product_id, position, name, price, ram, storage,
                                      ram_gb, storage_gb, colors_json)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&variant.id.0)
            .bind(&product.id.0)
            .bind(position as i64)
            .bind(&variant.name)
            .bind(variant.price)
            .bind(&variant.memory.ram)
            .bind(&variant.memory.storage)
            .bind(to_sql_int(metrics.ram_gb))
            .bind(to_sql_int(metrics.storage_gb))
            .bind(to_json(&variant.colors)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use techshop_core::domain::product::{
        Brand, BrandId, Category, CategoryId, ColorOption, Memory, Product, ProductId, Variant,
        VariantId, BATTERY_CAPACITY_ATTRIBUTE,
    };
    use techshop_core::search::{
        Bound, Dimension, FilterResolver, NameResolution, PlanOptions, PriceOrder, SearchPlan,
        SlotInput, UnparsedSpec,
    };

    use super::{search_query, SqlCatalogRepository};
    use crate::repositories::{CatalogRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlCatalogRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        let repo = SqlCatalogRepository::new(pool);

        repo.save_category(Category {
            id: CategoryId("cat-phone".to_string()),
            name: "Điện thoại".to_string(),
            description: None,
        })
        .await
        .expect("save category");
        repo.save_category(Category {
            id: CategoryId("cat-laptop".to_string()),
            name: "Laptop".to_string(),
            description: Some("Máy tính xách tay".to_string()),
        })
        .await
        .expect("save category");
        repo.save_brand(Brand {
            id: BrandId("brand-samsung".to_string()),
            name: "Samsung".to_string(),
            description: None,
            logo_url: None,
        })
        .await
        .expect("save brand");

        let phones = [
            ("p-a", "Galaxy A15", 10, Some("5000 mAh"), &[(4_990_000, "8 GB", "128 GB")][..]),
            (
                "p-b",
                "Galaxy A55",
                0,
                Some("5000 mAh"),
                &[(9_990_000, "8 GB", "128 GB"), (11_490_000, "12 GB", "256 GB")][..],
            ),
            ("p-c", "Galaxy Z Fold", 0, None, &[(40_990_000, "Đang cập nhật", "1 TB")][..]),
        ];
        for (id, name, discount, battery, variants) in phones {
            let mut attributes = BTreeMap::new();
            if let Some(battery) = battery {
                attributes.insert(BATTERY_CAPACITY_ATTRIBUTE.to_string(), battery.to_string());
            }
            let product = Product {
                id: ProductId(id.to_string()),
                name: name.to_string(),
                description: None,
                category_id: Some(CategoryId("cat-phone".to_string())),
                brand_id: Some(BrandId("brand-samsung".to_string())),
                discount,
                variant_ids: vec![],
                attributes,
                sold_count: 10,
                view_count: 100,
                average_rating: 4.5,
            };
            let variants = variants
                .iter()
                .enumerate()
                .map(|(index, (price, ram, storage))| Variant {
                    id: VariantId(format!("{id}-v{index}")),
                    product_id: product.id.clone(),
                    name: None,
                    price: *price,
                    memory: Memory {
                        ram: Some(ram.to_string()),
                        storage: Some(storage.to_string()),
                    },
                    colors: vec![ColorOption {
                        color_name: "Đen".to_string(),
                        images: vec![format!("https://cdn.example/{id}.png")],
                    }],
                })
                .collect();
            repo.save_product(product, variants).await.expect("save product");
        }

        repo
    }

    fn ids(records: &[techshop_core::domain::product::VariantRecord]) -> Vec<&str> {
        records.iter().map(|record| record.variant_id.0.as_str()).collect()
    }

    #[tokio::test]
    async fn cheap_phone_query_filters_sorts_and_projects() {
        let repo = repository().await;
        let slots = SlotInput {
            category: Some("điện thoại".to_string()),
            qualifiers: vec!["cheap".to_string()],
            ..SlotInput::default()
        };
        let filters = FilterResolver::default().resolve(&slots);
        let resolution = repo.resolve_names(&filters).await.expect("resolve names");
        let plan = SearchPlan::from_filters(&filters, &resolution, &PlanOptions::default())
            .expect("plan");

        let records = repo.search(&plan).await.expect("search");

        assert_eq!(ids(&records), vec!["p-a-v0"]);
        let record = &records[0];
        assert_eq!(record.price, 4_990_000);
        assert_eq!(record.discount, 10);
        assert_eq!(record.battery.as_deref(), Some("5000 mAh"));
        assert_eq!(record.images, vec!["https://cdn.example/p-a.png".to_string()]);
        assert_eq!(record.memory.ram.as_deref(), Some("8 GB"));
    }

    #[tokio::test]
    async fn unparsed_ram_follows_plan_policy() {
        let repo = repository().await;
        let plan_for = |unparsed| {
            SearchPlan::builder()
                .bound(Dimension::Ram, Bound::AtLeast(12))
                .order(PriceOrder::Descending)
                .unparsed(unparsed)
                .build()
                .expect("plan")
        };

        let excluded = repo.search(&plan_for(UnparsedSpec::Exclude)).await.expect("search");
        let included = repo.search(&plan_for(UnparsedSpec::Include)).await.expect("search");
        let zeroed = repo.search(&plan_for(UnparsedSpec::TreatAsZero)).await.expect("search");

        assert_eq!(ids(&excluded), vec!["p-b-v1"]);
        assert_eq!(ids(&included), vec!["p-c-v0", "p-b-v1"]);
        assert_eq!(ids(&zeroed), vec!["p-b-v1"]);
    }

    #[tokio::test]
    async fn terabyte_storage_and_battery_bounds_use_parsed_columns() {
        let repo = repository().await;
        let plan = SearchPlan::builder()
            .bound(Dimension::Storage, Bound::AtLeast(512))
            .build()
            .expect("plan");
        assert_eq!(ids(&repo.search(&plan).await.expect("search")), vec!["p-c-v0"]);

        let plan = SearchPlan::builder()
            .bound(Dimension::Battery, Bound::AtLeast(5000))
            .limit(2)
            .build()
            .expect("plan");
        assert_eq!(ids(&repo.search(&plan).await.expect("search")), vec!["p-a-v0", "p-b-v0"]);
    }

    #[tokio::test]
    async fn names_resolve_case_insensitively_with_vietnamese_letters() {
        let repo = repository().await;

        assert_eq!(
            repo.resolve_category("ĐIỆN THOẠI").await.expect("resolve"),
            Some(CategoryId("cat-phone".to_string()))
        );
        assert_eq!(
            repo.resolve_brand("samsung").await.expect("resolve"),
            Some(BrandId("brand-samsung".to_string()))
        );
        assert_eq!(repo.resolve_category("máy ảnh").await.expect("resolve"), None);

        let names: Vec<String> = repo
            .list_categories()
            .await
            .expect("list")
            .into_iter()
            .map(|category| category.name)
            .collect();
        assert_eq!(names, vec!["Laptop".to_string(), "Điện thoại".to_string()]);
    }

    #[tokio::test]
    async fn brand_summary_counts_products_and_prices_samples_by_first_variant() {
        let repo = repository().await;

        let summary = repo.brand_summary("SAMSUNG").await.expect("summary").expect("brand");

        assert_eq!(summary.product_count, 3);
        assert_eq!(summary.samples.len(), 3);
        assert_eq!(summary.samples[1].name, "Galaxy A55");
        assert_eq!(summary.samples[1].price, Some(9_990_000));
        assert!(repo.brand_summary("Sam").await.expect("summary").is_none());
    }

    #[tokio::test]
    async fn product_lookup_loads_variants_in_position_order() {
        let repo = repository().await;

        let product = repo.find_product_by_name("a55").await.expect("find").expect("product");
        let variants = repo.variants_for_product(&product.id).await.expect("variants");

        assert_eq!(product.name, "Galaxy A55");
        assert_eq!(product.variant_ids.len(), 2);
        assert_eq!(variants[0].id, product.variant_ids[0]);
        assert_eq!(variants[1].memory.storage.as_deref(), Some("256 GB"));
        assert!(variants[0].has_color("đen"));
    }

    #[tokio::test]
    async fn negative_price_leaves_the_stored_product_untouched() {
        let repo = repository().await;
        let id = ProductId("p-b".to_string());
        let mut product = repo.find_product(&id).await.expect("find").expect("product");
        let mut variants = repo.variants_for_product(&id).await.expect("variants");
        product.name = "Galaxy A55 (sửa)".to_string();
        variants[1].price = -11_490_000;

        let error = repo.save_product(product, variants).await.expect_err("negative price");

        assert!(matches!(error, RepositoryError::InvalidRecord(message) if message.contains("p-b-v1")));
        let stored = repo.find_product(&id).await.expect("find").expect("product");
        assert_eq!(stored.name, "Galaxy A55");
        assert_eq!(repo.variants_for_product(&id).await.expect("variants")[1].price, 11_490_000);
        assert_eq!(repo.find_product(&ProductId("p-missing".to_string())).await.expect("find"), None);
    }

    #[test]
    fn include_policy_renders_null_tolerant_predicate() {
        let plan = SearchPlan::from_filters(
            &FilterResolver::default().resolve(&SlotInput {
                min_ram: Some("8".to_string()),
                ..SlotInput::default()
            }),
            &NameResolution::default(),
            &PlanOptions { unparsed: UnparsedSpec::Include, ..PlanOptions::default() },
        )
        .expect("plan");

        let query = search_query(&plan);

        assert!(query.sql().contains("(v.ram_gb IS NULL OR v.ram_gb >= ?)"));
        assert!(query.sql().contains("ORDER BY v.price ASC"));
    }
}
