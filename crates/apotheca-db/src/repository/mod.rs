//! # Repository Module
//!
//! Database repository implementations for Apotheca POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.drugs().update(id, &patch, &identity)                      │
//! │       ▼                                                                 │
//! │  DrugRepository                                                        │
//! │  ├── list / get / low_stock / history                                  │
//! │  ├── create / create_many                                              │
//! │  ├── update            (diff + modification log)                       │
//! │  ├── change_state      (delete / restore / lock)                       │
//! │  ├── transition        (change_state, or purge)                        │
//! │  └── batch_delete                                                      │
//! │       │                                                                 │
//! │       │  SQL inside one BEGIN IMMEDIATE transaction                     │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Accounts and profiles
//! - [`DrugRepository`](drug::DrugRepository) - Catalog and lifecycle
//! - [`SaleRepository`](sale::SaleRepository) - Sale transaction and history
//! - [`StatsRepository`](stats::StatsRepository) - Dashboard aggregates

pub mod drug;
pub mod sale;
pub mod stats;
pub mod user;

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::DbResult;

/// Opens a transaction that holds SQLite's write lock from the start.
///
/// Every read-then-write path goes through here. A deferred `BEGIN` whose
/// read snapshot is overtaken by another writer fails with `SQLITE_BUSY` on
/// its first write, without waiting on the busy timeout. `BEGIN IMMEDIATE`
/// makes the second writer queue at `BEGIN` instead.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    Ok(tx)
}
