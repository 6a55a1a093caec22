use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use techshop_core::domain::product::{CategoryId, ProductId};
use techshop_core::domain::promotion::{Promotion, PromotionValue};
use techshop_core::domain::store::{Branch, Inventory, StockLine, WarrantyPolicy};

use super::{RepositoryError, StoreRepository};
use crate::DbPool;

pub struct SqlStoreRepository {
    pool: DbPool,
}

impl SqlStoreRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Decode(e.to_string())
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})")),
    )
}

/// Fixed-width UTC so the text column sorts chronologically.
fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait::async_trait]
impl StoreRepository for SqlStoreRepository {
    async fn inventory_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<Inventory>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT variant_color, stock FROM inventory_line
             WHERE product_id = ? ORDER BY rowid",
        )
        .bind(&product_id.0)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let lines = rows
            .iter()
            .map(|row| {
                let stock: i64 = row.try_get("stock").map_err(decode_err)?;
                Ok(StockLine {
                    variant_color: row.try_get("variant_color").map_err(decode_err)?,
                    stock: u32::try_from(stock).unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Some(Inventory { product_id: product_id.clone(), lines }))
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, phone, email, address FROM branch ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Branch {
                    id: row.try_get("id").map_err(decode_err)?,
                    name: row.try_get("name").map_err(decode_err)?,
                    phone: row.try_get("phone").map_err(decode_err)?,
                    email: row.try_get("email").map_err(decode_err)?,
                    address: row.try_get("address").map_err(decode_err)?,
                })
            })
            .collect()
    }

    async fn list_warranty_policies(&self) -> Result<Vec<WarrantyPolicy>, RepositoryError> {
        let rows =
            sqlx::query("SELECT id, name, description FROM warranty_policy ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|row| {
                Ok(WarrantyPolicy {
                    id: row.try_get("id").map_err(decode_err)?,
                    name: row.try_get("name").map_err(decode_err)?,
                    description: row.try_get("description").map_err(decode_err)?,
                })
            })
            .collect()
    }

    async fn save_inventory(&self, inventory: Inventory) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM inventory_line WHERE product_id = ?")
            .bind(&inventory.product_id.0)
            .execute(&mut *tx)
            .await?;

        for line in &inventory.lines {
            sqlx::query(
                "INSERT INTO inventory_line (product_id, variant_color, stock) VALUES (?, ?, ?)
                 ON CONFLICT(product_id, variant_color) DO UPDATE SET stock = excluded.stock",
            )
            .bind(&inventory.product_id.0)
            .bind(&line.variant_color)
            .bind(i64::from(line.stock))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn save_branch(&self, branch: Branch) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO branch (id, name, phone, email, address) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 phone = excluded.phone,
                 email = excluded.email,
                 address = excluded.address",
        )
        .bind(&branch.id)
        .bind(&branch.name)
        .bind(&branch.phone)
        .bind(&branch.email)
        .bind(&branch.address)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_warranty_policy(&self, policy: WarrantyPolicy) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO warranty_policy (id, name, description) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description",
        )
        .bind(&policy.id)
        .bind(&policy.name)
        .bind(&policy.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_promotions(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let links: Vec<(String, String)> = sqlx::query_as(
            "SELECT promotion_id, category_id FROM promotion_category
             ORDER BY promotion_id, category_id",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut categories: BTreeMap<String, Vec<CategoryId>> = BTreeMap::new();
        for (promotion_id, category_id) in links {
            categories.entry(promotion_id).or_default().push(CategoryId(category_id));
        }

        let rows = sqlx::query(
            "SELECT id, title, value_type, value, starts_at, ends_at, is_active
             FROM promotion ORDER BY ends_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id").map_err(decode_err)?;
                let kind: String = row.try_get("value_type").map_err(decode_err)?;
                let amount: i64 = row.try_get("value").map_err(decode_err)?;
                let value = PromotionValue::from_parts(&kind, amount).ok_or_else(|| {
                    RepositoryError::Decode(format!("unknown promotion value type `{kind}`"))
                })?;
                Ok(Promotion {
                    title: row.try_get("title").map_err(decode_err)?,
                    value,
                    starts_at: parse_timestamp("starts_at", row.try_get("starts_at").map_err(decode_err)?)?,
                    ends_at: parse_timestamp("ends_at", row.try_get("ends_at").map_err(decode_err)?)?,
                    is_active: row.try_get("is_active").map_err(decode_err)?,
                    category_ids: categories.remove(&id).unwrap_or_default(),
                    id,
                })
            })
            .collect()
    }

    async fn save_promotion(&self, promotion: Promotion) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO promotion (id, title, value_type, value, starts_at, ends_at, is_active)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 value_type = excluded.value_type,
                 value = excluded.value,
                 starts_at = excluded.starts_at,
                 ends_at = excluded.ends_at,
                 is_active = excluded.is_active",
        )
        .bind(&promotion.id)
        .bind(&promotion.title)
        .bind(promotion.value.kind())
        .bind(promotion.value.amount())
        .bind(format_timestamp(promotion.starts_at))
        .bind(format_timestamp(promotion.ends_at))
        .bind(promotion.is_active)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM promotion_category WHERE promotion_id = ?")
            .bind(&promotion.id)
            .execute(&mut *tx)
            .await?;

        for category in &promotion.category_ids {
            sqlx::query("INSERT INTO promotion_category (promotion_id, category_id) VALUES (?, ?)")
                .bind(&promotion.id)
                .bind(&category.0)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use techshop_core::domain::product::{CategoryId, ProductId};
    use techshop_core::domain::promotion::{Promotion, PromotionValue};
    use techshop_core::domain::store::{Branch, Inventory, StockLine, WarrantyPolicy};

    use super::SqlStoreRepository;
    use crate::repositories::StoreRepository;
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlStoreRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        sqlx::query("INSERT INTO product (id, name) VALUES ('p-1', 'iPhone 15')")
            .execute(&pool)
            .await
            .expect("insert product");
        sqlx::query("INSERT INTO category (id, name) VALUES ('cat-laptop', 'Laptop')")
            .execute(&pool)
            .await
            .expect("insert category");
        SqlStoreRepository::new(pool)
    }

    #[tokio::test]
    async fn inventory_round_trip_keeps_line_order() {
        let repo = repository().await;
        let inventory = Inventory {
            product_id: ProductId("p-1".to_string()),
            lines: vec![
                StockLine { variant_color: "128GB - Hồng".to_string(), stock: 4 },
                StockLine { variant_color: "128GB - Đen".to_string(), stock: 0 },
            ],
        };

        repo.save_inventory(inventory.clone()).await.expect("save inventory");
        let found = repo.inventory_for_product(&inventory.product_id).await.expect("load");

        assert_eq!(found, Some(inventory));
        assert_eq!(
            repo.inventory_for_product(&ProductId("p-404".to_string())).await.expect("load"),
            None
        );
    }

    #[tokio::test]
    async fn branches_and_policies_list_by_name() {
        let repo = repository().await;
        for (id, name) in [("b-2", "TechShop Quận 3"), ("b-1", "TechShop Quận 1")] {
            repo.save_branch(Branch {
                id: id.to_string(),
                name: name.to_string(),
                phone: Some("028 3822 0000".to_string()),
                email: None,
                address: None,
            })
            .await
            .expect("save branch");
        }
        repo.save_warranty_policy(WarrantyPolicy {
            id: "w-1".to_string(),
            name: "Bảo hành 12 tháng".to_string(),
            description: Some("Lỗi phần cứng do nhà sản xuất".to_string()),
        })
        .await
        .expect("save policy");

        let branches = repo.list_branches().await.expect("list branches");
        let policies = repo.list_warranty_policies().await.expect("list policies");

        assert_eq!(branches[0].name, "TechShop Quận 1");
        assert_eq!(branches[1].phone.as_deref(), Some("028 3822 0000"));
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].description.as_deref(), Some("Lỗi phần cứng do nhà sản xuất"));
    }

    #[tokio::test]
    async fn promotions_round_trip_with_categories_in_end_date_order() {
        let repo = repository().await;
        let storewide = Promotion {
            id: "promo-sale".to_string(),
            title: "Sale cuối tháng".to_string(),
            value: PromotionValue::Amount(300_000),
            starts_at: Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2026, 10, 31, 16, 59, 59).unwrap(),
            is_active: true,
            category_ids: vec![],
        };
        let laptops = Promotion {
            id: "promo-school".to_string(),
            title: "Back to school".to_string(),
            value: PromotionValue::Percent(10),
            starts_at: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2026, 9, 30, 16, 59, 59).unwrap(),
            is_active: false,
            category_ids: vec![CategoryId("cat-laptop".to_string())],
        };

        repo.save_promotion(storewide.clone()).await.expect("save storewide");
        repo.save_promotion(laptops.clone()).await.expect("save laptops");
        assert_eq!(repo.list_promotions().await.expect("list"), vec![laptops.clone(), storewide]);

        repo.save_promotion(Promotion { category_ids: vec![], ..laptops })
            .await
            .expect("resave");
        let listed = repo.list_promotions().await.expect("list");
        assert!(listed[0].category_ids.is_empty());
    }
}
