//! # Stats Repository
//!
//! Read-only aggregates for the dashboard and the health endpoint.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use apotheca_core::DashboardStats;

/// Row counts reported by the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCounts {
    pub users: i64,
    /// All drug rows, including the recycle bin.
    pub drugs: i64,
    pub sales: i64,
}

/// Repository for aggregate queries.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    /// Totals across all sales plus the active catalog's size and
    /// low-stock count.
    pub async fn dashboard(&self) -> DbResult<DashboardStats> {
        debug!("Computing dashboard stats");

        let (total_sales, total_revenue_cents): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(total_cents), 0) FROM sales")
                .fetch_one(&self.pool)
                .await?;

        let (total_products, low_stock_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN stock <= min_stock_threshold THEN 1 ELSE 0 END), 0)
            FROM drugs
            WHERE is_deleted = 0
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_sales,
            total_revenue_cents,
            low_stock_count,
            total_products,
        })
    }

    /// Sum of `price × stock` over the active catalog, in cents.
    pub async fn inventory_value_cents(&self) -> DbResult<i64> {
        let value: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(price_cents * stock), 0) FROM drugs WHERE is_deleted = 0",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(value)
    }

    pub async fn table_counts(&self) -> DbResult<TableCounts> {
        let (users, drugs, sales): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM drugs),
                (SELECT COUNT(*) FROM sales)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TableCounts { users, drugs, sales })
    }
}
