//! # Sale Repository
//!
//! The sale transaction and sales history.
//!
//! ## Sale Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_cart(items)            ← before touching storage             │
//! │       │                                                                 │
//! │  BEGIN IMMEDIATE                  ← concurrent sales queue here         │
//! │       ├── load every referenced drug                                   │
//! │       ├── price_cart(items, drugs)  ← missing / deleted / short stock   │
//! │       ├── INSERT sales                                                 │
//! │       ├── for each line:                                               │
//! │       │     INSERT sale_items                                          │
//! │       │     UPDATE drugs SET stock = stock - q                         │
//! │       │       WHERE id = ? AND stock >= q   (0 rows ⇒ abort)           │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error before COMMIT drops the transaction, so a failed sale leaves no
//! sale row and no stock change behind.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::begin_write;
use crate::repository::drug::{fetch_drug, fetch_drugs_by_ids};
use apotheca_core::sale::{price_cart, validate_cart};
use apotheca_core::{CoreError, Identity, SaleItem, SaleRecord, SaleRequest};

/// Page size when the caller doesn't ask for one.
pub const DEFAULT_SALES_LIMIT: i64 = 100;

/// Largest page a caller may request.
pub const MAX_SALES_LIMIT: i64 = 500;

/// Clamps a requested page size into `1..=MAX_SALES_LIMIT`.
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_SALES_LIMIT)
        .clamp(1, MAX_SALES_LIMIT)
}

const SALE_SELECT: &str = r#"
    SELECT s.id, s.created_at, s.total_cents, s.cashier_id,
           u.name AS cashier_name, s.customer_name
    FROM sales s
    LEFT JOIN users u ON u.id = s.cashier_id
"#;

/// Loads the items of `sales` and attaches them in cart order.
async fn attach_items(conn: &mut SqliteConnection, sales: &mut [SaleRecord]) -> DbResult<()> {
    if sales.is_empty() {
        return Ok(());
    }

    let ids: Vec<String> = sales.iter().map(|s| s.id.clone()).collect();
    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT id, sale_id, drug_id, drug_name, quantity, unit_price_cents, line_total_cents
        FROM sale_items
        WHERE sale_id IN (
        "#,
    );
    let mut separated = qb.separated(", ");
    for id in &ids {
        separated.push_bind(id.as_str());
    }
    separated.push_unseparated(") ORDER BY sale_id, line_no");

    let items = qb.build_query_as::<SaleItem>().fetch_all(&mut *conn).await?;

    let mut grouped: HashMap<String, Vec<SaleItem>> = HashMap::new();
    for item in items {
        grouped.entry(item.sale_id.clone()).or_default().push(item);
    }
    for sale in sales.iter_mut() {
        sale.items = grouped.remove(&sale.id).unwrap_or_default();
    }

    Ok(())
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale and decrements stock, atomically.
    ///
    /// ## Errors
    /// - `Domain(EmptyCart | CartTooLarge | Validation)` for a malformed cart
    /// - `Domain(DrugNotFound)` for a missing or soft-deleted drug
    /// - `Domain(InsufficientStock)` when demand exceeds stock, including
    ///   when a concurrent sale got there first
    pub async fn create_sale(&self, request: &SaleRequest, cashier: &Identity) -> DbResult<SaleRecord> {
        debug!(
            lines = request.items.len(),
            cashier = %cashier.username,
            "Processing sale"
        );

        validate_cart(&request.items)?;

        let customer_name = request
            .customer_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let mut tx = begin_write(&self.pool).await?;

        // The stored name, not the token's: a profile rename outlives old tokens.
        let cashier_name: Option<String> =
            sqlx::query_scalar("SELECT name FROM users WHERE id = ?1")
                .bind(&cashier.user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let drug_ids: Vec<String> = request.items.iter().map(|l| l.drug_id.clone()).collect();
        let drugs = fetch_drugs_by_ids(&mut tx, &drug_ids).await?;
        let priced = price_cart(&request.items, &drugs)?;

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO sales (id, created_at, total_cents, cashier_id, customer_name)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&sale_id)
        .bind(now)
        .bind(priced.total.cents())
        .bind(&cashier.user_id)
        .bind(&customer_name)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.lines.len());
        for (line_no, line) in priced.lines.iter().enumerate() {
            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                drug_id: line.drug_id.clone(),
                drug_name: line.drug_name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                line_total_cents: line.line_total.cents(),
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, line_no, drug_id, drug_name,
                    quantity, unit_price_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(line_no as i64)
            .bind(&item.drug_id)
            .bind(&item.drug_name)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.line_total_cents)
            .execute(&mut *tx)
            .await?;

            let result = sqlx::query(
                r#"
                UPDATE drugs SET stock = stock - ?2
                WHERE id = ?1 AND is_deleted = 0 AND stock >= ?2
                "#,
            )
            .bind(&item.drug_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let current = fetch_drug(&mut tx, &item.drug_id).await?;
                warn!(drug_id = %item.drug_id, "Stock changed during sale; rolling back");
                return Err(match current {
                    Some(drug) => CoreError::InsufficientStock {
                        code: drug.code,
                        name: drug.name,
                        available: drug.stock,
                        requested: item.quantity,
                    },
                    None => CoreError::DrugNotFound(item.drug_id.clone()),
                }
                .into());
            }

            items.push(item);
        }

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            total_cents = priced.total.cents(),
            lines = items.len(),
            cashier = %cashier.username,
            "Sale completed"
        );

        Ok(SaleRecord {
            id: sale_id,
            created_at: now,
            total_cents: priced.total.cents(),
            cashier_id: cashier.user_id.clone(),
            cashier_name,
            customer_name,
            items,
        })
    }

    /// Gets a sale with its items.
    pub async fn get(&self, id: &str) -> DbResult<Option<SaleRecord>> {
        debug!(id = %id, "Getting sale by ID");

        let mut conn = self.pool.acquire().await?;
        let sale = sqlx::query_as::<_, SaleRecord>(&format!("{SALE_SELECT} WHERE s.id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(sale) = sale else {
            return Ok(None);
        };
        let mut sales = [sale];
        attach_items(&mut conn, &mut sales).await?;
        let [sale] = sales;
        Ok(Some(sale))
    }

    /// Lists sales newest first. `limit` is clamped with [`clamp_limit`].
    pub async fn list(&self, limit: Option<i64>, offset: Option<i64>) -> DbResult<Vec<SaleRecord>> {
        let limit = clamp_limit(limit);
        let offset = offset.unwrap_or(0).max(0);
        debug!(limit, offset, "Listing sales");

        let mut conn = self.pool.acquire().await?;
        let mut sales = sqlx::query_as::<_, SaleRecord>(&format!(
            "{SALE_SELECT} ORDER BY s.created_at DESC, s.rowid DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        attach_items(&mut conn, &mut sales).await?;
        Ok(sales)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Tests
// =============================================================================
