//! # Drug Repository
//!
//! Catalog storage: create, edit with audit log, lifecycle transitions and
//! batch delete.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_many   BEGIN → validate batch → code free? → INSERT × n → COMMIT│
//! │                                                                         │
//! │  update        BEGIN → load → apply_patch → validate → diff            │
//! │                      → (code free?) → UPDATE + INSERT log → COMMIT     │
//! │                                                                         │
//! │  change_state  BEGIN → load → plan_transition → one write → COMMIT     │
//! │  purge         BEGIN → load → check_purge → DELETE → COMMIT            │
//! │                                                                         │
//! │  batch_delete  BEGIN → load ids → plan_batch_delete → UPDATE × n → COMMIT│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rule comes from `apotheca_core`; this module only sequences reads
//! and writes inside one transaction. Each `BEGIN` above is a
//! [`begin_write`] (`BEGIN IMMEDIATE`), so the load always sees the state
//! the write applies to. Returning early drops the transaction, which rolls
//! it back.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;
use apotheca_core::diff::{apply_patch, diff_drug};
use apotheca_core::lifecycle::{check_purge, plan_batch_delete, plan_transition};
use apotheca_core::validation::{validate_drug, validate_new_drug_batch};
use apotheca_core::{
    BatchDeleteOutcome, CoreError, Drug, DrugAction, DrugPatch, DrugView, FieldChange, Identity,
    ModificationEntry, NewDrug, StateChange, Transition, ValidationError,
    DEFAULT_MIN_STOCK_THRESHOLD,
};

const DRUG_COLUMNS: &str = r#"
    d.id, d.code, d.name, d.category, d.manufacturer,
    d.price_cents, d.stock, d.min_stock_threshold, d.expiry_date,
    d.description, d.side_effects,
    d.is_locked, d.is_deleted, d.deleted_at, d.deleted_by,
    d.created_at, d.created_by
"#;

fn view_select() -> String {
    format!(
        r#"
        SELECT {DRUG_COLUMNS},
            cu.name AS created_by_name,
            du.name AS deleted_by_name
        FROM drugs d
        LEFT JOIN users cu ON cu.id = d.created_by
        LEFT JOIN users du ON du.id = d.deleted_by
        "#
    )
}

/// Raw modification log row; `changes` is a JSON array.
#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    id: String,
    drug_id: String,
    changed_at: DateTime<Utc>,
    changed_by: String,
    changed_by_name: Option<String>,
    changes: String,
}

impl TryFrom<LogRow> for ModificationEntry {
    type Error = DbError;

    fn try_from(row: LogRow) -> DbResult<Self> {
        let changes: Vec<FieldChange> =
            serde_json::from_str(&row.changes).map_err(|e| DbError::Corrupt {
                what: format!("modification log {}", row.id),
                reason: e.to_string(),
            })?;

        Ok(ModificationEntry {
            id: row.id,
            drug_id: row.drug_id,
            changed_at: row.changed_at,
            changed_by: row.changed_by,
            changed_by_name: row.changed_by_name,
            changes,
        })
    }
}

/// Result of a lifecycle action.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// The drug still exists; here is its current state.
    Updated(DrugView),
    /// The row and its history are gone.
    Purged { id: String, code: String },
}

// =============================================================================
// Connection-level helpers (usable inside any transaction)
// =============================================================================

pub(crate) async fn fetch_drug(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Drug>> {
    let drug = sqlx::query_as::<_, Drug>(&format!(
        "SELECT {DRUG_COLUMNS} FROM drugs d WHERE d.id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(drug)
}

/// Loads every drug whose id is in `ids`, deleted or not.
pub(crate) async fn fetch_drugs_by_ids(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> DbResult<Vec<Drug>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {DRUG_COLUMNS} FROM drugs d WHERE d.id IN ("
    ));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.as_str());
    }
    separated.push_unseparated(")");

    let drugs = qb.build_query_as::<Drug>().fetch_all(&mut *conn).await?;
    Ok(drugs)
}

async fn code_taken(
    conn: &mut SqliteConnection,
    code: &str,
    except_id: Option<&str>,
) -> DbResult<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM drugs
        WHERE code = ?1 AND is_deleted = 0 AND (?2 IS NULL OR id != ?2)
        "#,
    )
    .bind(code)
    .bind(except_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count > 0)
}

/// Loads the modification logs of `drug_ids`, grouped by drug, newest first.
async fn fetch_history(
    conn: &mut SqliteConnection,
    drug_ids: &[String],
) -> DbResult<HashMap<String, Vec<ModificationEntry>>> {
    let mut grouped: HashMap<String, Vec<ModificationEntry>> = HashMap::new();
    if drug_ids.is_empty() {
        return Ok(grouped);
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT m.id, m.drug_id, m.changed_at, m.changed_by,
               u.name AS changed_by_name, m.changes
        FROM modification_logs m
        LEFT JOIN users u ON u.id = m.changed_by
        WHERE m.drug_id IN (
        "#,
    );
    let mut separated = qb.separated(", ");
    for id in drug_ids {
        separated.push_bind(id.as_str());
    }
    separated.push_unseparated(") ORDER BY m.changed_at DESC, m.rowid DESC");

    let rows = qb.build_query_as::<LogRow>().fetch_all(&mut *conn).await?;
    for row in rows {
        let entry = ModificationEntry::try_from(row)?;
        grouped.entry(entry.drug_id.clone()).or_default().push(entry);
    }

    Ok(grouped)
}

async fn attach_history(conn: &mut SqliteConnection, views: &mut [DrugView]) -> DbResult<()> {
    let ids: Vec<String> = views.iter().map(|v| v.drug.id.clone()).collect();
    let mut history = fetch_history(conn, &ids).await?;
    for view in views.iter_mut() {
        view.history = history.remove(&view.drug.id).unwrap_or_default();
    }
    Ok(())
}

async fn fetch_view(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<DrugView>> {
    let view = sqlx::query_as::<_, DrugView>(&format!("{} WHERE d.id = ?1", view_select()))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match view {
        Some(view) => {
            let mut views = [view];
            attach_history(conn, &mut views).await?;
            let [view] = views;
            Ok(Some(view))
        }
        None => Ok(None),
    }
}

async fn insert_drug(
    conn: &mut SqliteConnection,
    input: &NewDrug,
    actor: &Identity,
    now: DateTime<Utc>,
) -> DbResult<Drug> {
    let drug = Drug {
        id: Uuid::new_v4().to_string(),
        code: input.code.trim().to_string(),
        name: input.name.trim().to_string(),
        category: input.category.trim().to_string(),
        manufacturer: input.manufacturer.trim().to_string(),
        price_cents: input.price_cents,
        stock: input.stock,
        min_stock_threshold: input
            .min_stock_threshold
            .unwrap_or(DEFAULT_MIN_STOCK_THRESHOLD),
        expiry_date: input.expiry_date,
        description: non_blank(input.description.as_deref()),
        side_effects: non_blank(input.side_effects.as_deref()),
        is_locked: false,
        is_deleted: false,
        deleted_at: None,
        deleted_by: None,
        created_at: now,
        created_by: Some(actor.user_id.clone()),
    };

    sqlx::query(
        r#"
        INSERT INTO drugs (
            id, code, name, category, manufacturer,
            price_cents, stock, min_stock_threshold, expiry_date,
            description, side_effects,
            is_locked, is_deleted, created_at, created_by
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11,
            0, 0, ?12, ?13
        )
        "#,
    )
    .bind(&drug.id)
    .bind(&drug.code)
    .bind(&drug.name)
    .bind(&drug.category)
    .bind(&drug.manufacturer)
    .bind(drug.price_cents)
    .bind(drug.stock)
    .bind(drug.min_stock_threshold)
    .bind(drug.expiry_date)
    .bind(&drug.description)
    .bind(&drug.side_effects)
    .bind(drug.created_at)
    .bind(&drug.created_by)
    .execute(&mut *conn)
    .await
    .map_err(|e| code_conflict(e, &drug.code))?;

    Ok(drug)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Maps a unique-index failure on `drugs.code` to a readable conflict.
fn code_conflict(err: sqlx::Error, code: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("code", code),
        other => other,
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for drug database operations.
#[derive(Debug, Clone)]
pub struct DrugRepository {
    pool: SqlitePool,
}

impl DrugRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DrugRepository { pool }
    }

    /// Lists the active catalog (`deleted = false`) or the recycle bin,
    /// newest first, each with history and creator / deleter names.
    pub async fn list(&self, deleted: bool) -> DbResult<Vec<DrugView>> {
        debug!(deleted, "Listing drugs");

        let mut conn = self.pool.acquire().await?;
        let mut views = sqlx::query_as::<_, DrugView>(&format!(
            "{} WHERE d.is_deleted = ?1 \
             ORDER BY COALESCE(d.deleted_at, d.created_at) DESC, d.rowid DESC",
            view_select()
        ))
        .bind(deleted)
        .fetch_all(&mut *conn)
        .await?;

        attach_history(&mut conn, &mut views).await?;
        Ok(views)
    }

    /// Gets one drug, in either state, with its full history.
    pub async fn get(&self, id: &str) -> DbResult<Option<DrugView>> {
        debug!(id = %id, "Getting drug by ID");

        let mut conn = self.pool.acquire().await?;
        fetch_view(&mut conn, id).await
    }

    /// Gets the bare drug row.
    pub async fn get_drug(&self, id: &str) -> DbResult<Option<Drug>> {
        let mut conn = self.pool.acquire().await?;
        fetch_drug(&mut conn, id).await
    }

    /// Creates one drug.
    pub async fn create(&self, input: &NewDrug, actor: &Identity) -> DbResult<Drug> {
        let mut created = self.create_many(std::slice::from_ref(input), actor).await?;
        created
            .pop()
            .ok_or_else(|| DbError::Internal("create returned no rows".to_string()))
    }

    /// Creates several drugs atomically: either all are inserted or none.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for an invalid record or a code repeated in the batch
    /// - `UniqueViolation` when a code is held by an active drug
    pub async fn create_many(&self, inputs: &[NewDrug], actor: &Identity) -> DbResult<Vec<Drug>> {
        debug!(count = inputs.len(), actor = %actor.username, "Creating drugs");

        validate_new_drug_batch(inputs).map_err(CoreError::from)?;

        let now = Utc::now();
        let mut tx = begin_write(&self.pool).await?;
        let mut created = Vec::with_capacity(inputs.len());

        for input in inputs {
            let code = input.code.trim();
            if code_taken(&mut tx, code, None).await? {
                return Err(DbError::duplicate("code", code));
            }
            created.push(insert_drug(&mut tx, input, actor, now).await?);
        }

        tx.commit().await?;

        info!(
            count = created.len(),
            actor = %actor.username,
            "Drugs created"
        );
        Ok(created)
    }

    /// Applies a partial update and logs the field-level diff.
    ///
    /// Identical values produce no log entry. Drugs in the recycle bin may
    /// be edited too.
    pub async fn update(&self, id: &str, patch: &DrugPatch, actor: &Identity) -> DbResult<DrugView> {
        debug!(id = %id, actor = %actor.username, "Updating drug");

        let mut tx = begin_write(&self.pool).await?;

        let current = fetch_drug(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Drug", id))?;

        let merged = apply_patch(&current, patch);
        validate_drug(&merged).map_err(CoreError::from)?;
        let changes = diff_drug(&current, &merged);

        if !changes.is_empty() {
            // Only active drugs occupy their code.
            if merged.code != current.code
                && !merged.is_deleted
                && code_taken(&mut tx, &merged.code, Some(id)).await?
            {
                return Err(DbError::duplicate("code", &merged.code));
            }

            sqlx::query(
                r#"
                UPDATE drugs SET
                    name = ?2, code = ?3, category = ?4, manufacturer = ?5,
                    price_cents = ?6, stock = ?7, min_stock_threshold = ?8,
                    expiry_date = ?9, description = ?10, side_effects = ?11
                WHERE id = ?1
                "#,
            )
            .bind(id)
            .bind(&merged.name)
            .bind(&merged.code)
            .bind(&merged.category)
            .bind(&merged.manufacturer)
            .bind(merged.price_cents)
            .bind(merged.stock)
            .bind(merged.min_stock_threshold)
            .bind(merged.expiry_date)
            .bind(&merged.description)
            .bind(&merged.side_effects)
            .execute(&mut *tx)
            .await
            .map_err(|e| code_conflict(e, &merged.code))?;

            let payload = serde_json::to_string(&changes)
                .map_err(|e| DbError::Internal(format!("Failed to encode changes: {}", e)))?;

            sqlx::query(
                r#"
                INSERT INTO modification_logs (id, drug_id, changed_at, changed_by, changes)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(id)
            .bind(Utc::now())
            .bind(&actor.user_id)
            .bind(payload)
            .execute(&mut *tx)
            .await?;
        }

        let view = fetch_view(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Drug", id))?;

        tx.commit().await?;

        if !changes.is_empty() {
            let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
            info!(id = %id, code = %view.drug.code, ?fields, actor = %actor.username, "Drug updated");
        }
        Ok(view)
    }

    /// Runs any lifecycle action, purge included.
    pub async fn transition(
        &self,
        id: &str,
        action: DrugAction,
        actor: &Identity,
    ) -> DbResult<TransitionOutcome> {
        match action.state_change() {
            Some(change) => self
                .change_state(id, change, actor)
                .await
                .map(TransitionOutcome::Updated),
            None => self.purge(id, actor).await,
        }
    }

    /// Deletes, restores or toggles the lock of a drug and returns its new
    /// state.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown id
    /// - `Domain(..)` when the lifecycle rules refuse the change
    /// - `UniqueViolation` when restoring onto a code an active drug holds
    pub async fn change_state(
        &self,
        id: &str,
        change: StateChange,
        actor: &Identity,
    ) -> DbResult<DrugView> {
        debug!(id = %id, action = change.as_str(), actor = %actor.username, "Drug transition");

        let mut tx = begin_write(&self.pool).await?;

        let drug = fetch_drug(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Drug", id))?;

        let transition = plan_transition(&drug, change, actor)?;

        match transition {
            Transition::SoftDelete => {
                sqlx::query(
                    "UPDATE drugs SET is_deleted = 1, deleted_at = ?2, deleted_by = ?3 WHERE id = ?1",
                )
                .bind(id)
                .bind(Utc::now())
                .bind(&actor.user_id)
                .execute(&mut *tx)
                .await?;
            }
            Transition::Restore => {
                if code_taken(&mut tx, &drug.code, Some(id)).await? {
                    return Err(DbError::duplicate("code", &drug.code));
                }
                sqlx::query(
                    "UPDATE drugs SET is_deleted = 0, deleted_at = NULL, deleted_by = NULL WHERE id = ?1",
                )
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| code_conflict(e, &drug.code))?;
            }
            Transition::SetLocked(locked) => {
                sqlx::query("UPDATE drugs SET is_locked = ?2 WHERE id = ?1")
                    .bind(id)
                    .bind(locked)
                    .execute(&mut *tx)
                    .await?;
            }
            Transition::Unchanged => {}
        }

        let view = fetch_view(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Drug", id))?;
        tx.commit().await?;

        if transition != Transition::Unchanged {
            info!(
                id = %id,
                code = %drug.code,
                action = change.as_str(),
                actor = %actor.username,
                "Drug lifecycle changed"
            );
        }
        Ok(view)
    }

    /// Removes a drug and its modification log for good. Admin only.
    async fn purge(&self, id: &str, actor: &Identity) -> DbResult<TransitionOutcome> {
        debug!(id = %id, actor = %actor.username, "Purging drug");

        let mut tx = begin_write(&self.pool).await?;

        let drug = fetch_drug(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Drug", id))?;

        check_purge(&drug, actor)?;

        // modification_logs cascade; sale_items keep their snapshot.
        sqlx::query("DELETE FROM drugs WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(id = %id, code = %drug.code, actor = %actor.username, "Drug purged");
        Ok(TransitionOutcome::Purged {
            id: drug.id,
            code: drug.code,
        })
    }

    /// Soft-deletes every active, unlocked drug in `ids` in one transaction.
    ///
    /// Locked drugs are skipped, never an error.
    pub async fn batch_delete(&self, ids: &[String], actor: &Identity) -> DbResult<BatchDeleteOutcome> {
        debug!(count = ids.len(), actor = %actor.username, "Batch deleting drugs");

        if ids.is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "ids".to_string(),
            })
            .into());
        }

        let mut tx = begin_write(&self.pool).await?;

        let found = fetch_drugs_by_ids(&mut tx, ids).await?;
        let plan = plan_batch_delete(ids, &found);

        let now = Utc::now();
        for id in &plan.deletable {
            sqlx::query(
                "UPDATE drugs SET is_deleted = 1, deleted_at = ?2, deleted_by = ?3 WHERE id = ?1",
            )
            .bind(id)
            .bind(now)
            .bind(&actor.user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let outcome = BatchDeleteOutcome {
            deleted: plan.deletable.len() as u64,
            skipped_locked: plan.skipped_locked,
            skipped_missing: plan.skipped_missing,
        };
        info!(
            deleted = outcome.deleted,
            skipped_locked = outcome.skipped_locked,
            skipped_missing = outcome.skipped_missing,
            actor = %actor.username,
            "Batch delete complete"
        );
        Ok(outcome)
    }

    /// Active drugs at or below their low-stock threshold, emptiest first.
    pub async fn low_stock(&self) -> DbResult<Vec<Drug>> {
        debug!("Listing low-stock drugs");

        let drugs = sqlx::query_as::<_, Drug>(&format!(
            r#"
            SELECT {DRUG_COLUMNS} FROM drugs d
            WHERE d.is_deleted = 0 AND d.stock <= d.min_stock_threshold
            ORDER BY d.stock ASC, d.name ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(drugs)
    }

    /// The modification log of one drug, newest first.
    pub async fn history(&self, id: &str) -> DbResult<Vec<ModificationEntry>> {
        let mut conn = self.pool.acquire().await?;
        let mut grouped = fetch_history(&mut conn, &[id.to_string()]).await?;
        Ok(grouped.remove(id).unwrap_or_default())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use apotheca_core::{DrugField, Role};
    use chrono::NaiveDate;
    use serde_json::json;

    async fn setup() -> (Database, Identity, Identity) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = db
            .users()
            .insert("admin", "hash", "Ada Admin", Role::Admin)
            .await
            .unwrap()
            .identity();
        let pharm = db
            .users()
            .insert("pharm", "hash", "Pat Pharmacist", Role::Pharmacist)
            .await
            .unwrap()
            .identity();
        (db, admin, pharm)
    }

    fn new_drug(code: &str, stock: i64) -> NewDrug {
        NewDrug {
            code: code.to_string(),
            name: format!("Drug {code}"),
            category: "Analgesic".to_string(),
            manufacturer: "Acme Pharma".to_string(),
            price_cents: 1250,
            stock,
            min_stock_threshold: Some(5),
            expiry_date: NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
            description: None,
            side_effects: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (db, _, pharm) = setup().await;
        let repo = db.drugs();

        let mut input = new_drug("D100", 10);
        input.min_stock_threshold = None;
        let drug = repo.create(&input, &pharm).await.unwrap();
        assert_eq!(drug.min_stock_threshold, DEFAULT_MIN_STOCK_THRESHOLD);

        let view = repo.get(&drug.id).await.unwrap().unwrap();
        assert_eq!(view.drug, drug);
        assert_eq!(view.created_by_name.as_deref(), Some("Pat Pharmacist"));
        assert!(view.history.is_empty());
    }

    #[tokio::test]
    async fn test_create_many_is_all_or_nothing() {
        let (db, _, pharm) = setup().await;
        let repo = db.drugs();
        repo.create(&new_drug("D100", 10), &pharm).await.unwrap();

        let err = repo
            .create_many(&[new_drug("D200", 1), new_drug("D100", 1)], &pharm)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(repo.list(false).await.unwrap().len(), 1);

        let err = repo
            .create_many(&[new_drug("D300", 1), new_drug("D300", 1)], &pharm)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_stock_update_logs_single_change() {
        let (db, _, pharm) = setup().await;
        let repo = db.drugs();
        let drug = repo.create(&new_drug("D100", 10), &pharm).await.unwrap();

        let patch = DrugPatch {
            stock: Some(7),
            ..Default::default()
        };
        let view = repo.update(&drug.id, &patch, &pharm).await.unwrap();
        assert_eq!(view.drug.stock, 7);
        assert_eq!(view.history.len(), 1);
        let entry = &view.history[0];
        assert_eq!(entry.changed_by_name.as_deref(), Some("Pat Pharmacist"));
        assert_eq!(entry.changes.len(), 1);
        assert_eq!(entry.changes[0].field, DrugField::Stock);
        assert_eq!(entry.changes[0].old_value, json!(10));
        assert_eq!(entry.changes[0].new_value, json!(7));

        // Same value again: nothing new in the log.
        let view = repo.update(&drug.id, &patch, &pharm).await.unwrap();
        assert_eq!(view.history.len(), 1);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_code_and_invalid_values() {
        let (db, _, pharm) = setup().await;
        let repo = db.drugs();
        repo.create(&new_drug("D100", 10), &pharm).await.unwrap();
        let other = repo.create(&new_drug("D200", 10), &pharm).await.unwrap();

        let err = repo
            .update(
                &other.id,
                &DrugPatch {
                    code: Some("D100".to_string()),
                    ..Default::default()
                },
                &pharm,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let err = repo
            .update(
                &other.id,
                &DrugPatch {
                    stock: Some(-1),
                    ..Default::default()
                },
                &pharm,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        assert!(repo.history(&other.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_restore_cycle() {
        let (db, _, pharm) = setup().await;
        let repo = db.drugs();
        let drug = repo.create(&new_drug("D100", 10), &pharm).await.unwrap();

        let outcome = repo.transition(&drug.id, DrugAction::Delete, &pharm).await.unwrap();
        let TransitionOutcome::Updated(view) = outcome else {
            panic!("expected updated drug");
        };
        assert!(view.drug.is_deleted);
        assert_eq!(view.deleted_by_name.as_deref(), Some("Pat Pharmacist"));
        assert!(repo.list(false).await.unwrap().is_empty());
        assert_eq!(repo.list(true).await.unwrap().len(), 1);

        // Deleting again is a conflict.
        let err = repo.transition(&drug.id, DrugAction::Delete, &pharm).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTransition { .. })));

        let TransitionOutcome::Updated(view) =
            repo.transition(&drug.id, DrugAction::Restore, &pharm).await.unwrap()
        else {
            panic!("expected updated drug");
        };
        assert!(!view.drug.is_deleted);
        assert!(view.drug.deleted_at.is_none());

        // Restoring an active drug is a no-op.
        let TransitionOutcome::Updated(again) =
            repo.transition(&drug.id, DrugAction::Restore, &pharm).await.unwrap()
        else {
            panic!("expected updated drug");
        };
        assert_eq!(again.drug, view.drug);
    }

    #[tokio::test]
    async fn test_change_state_returns_current_view() {
        let (db, admin, pharm) = setup().await;
        let repo = db.drugs();
        let drug = repo.create(&new_drug("D100", 10), &pharm).await.unwrap();

        let view = repo
            .change_state(&drug.id, StateChange::ToggleLock, &admin)
            .await
            .unwrap();
        assert!(view.drug.is_locked);

        let view = repo
            .change_state(&drug.id, StateChange::ToggleLock, &admin)
            .await
            .unwrap();
        assert!(!view.drug.is_locked);

        let view = repo
            .change_state(&drug.id, StateChange::Delete, &pharm)
            .await
            .unwrap();
        assert!(view.drug.is_deleted);
    }

    #[tokio::test]
    async fn test_locked_drug_survives_delete() {
        let (db, admin, pharm) = setup().await;
        let repo = db.drugs();
        let drug = repo.create(&new_drug("D001", 10), &pharm).await.unwrap();

        let err = repo.transition(&drug.id, DrugAction::ToggleLock, &pharm).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::AdminRequired { .. })));

        repo.transition(&drug.id, DrugAction::ToggleLock, &admin).await.unwrap();

        let err = repo.transition(&drug.id, DrugAction::Delete, &admin).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::DrugLocked { .. })));
        let stored = repo.get_drug(&drug.id).await.unwrap().unwrap();
        assert!(stored.is_locked);
        assert!(!stored.is_deleted);
    }

    #[tokio::test]
    async fn test_restore_onto_reused_code_conflicts() {
        let (db, _, pharm) = setup().await;
        let repo = db.drugs();
        let old = repo.create(&new_drug("D100", 10), &pharm).await.unwrap();
        repo.transition(&old.id, DrugAction::Delete, &pharm).await.unwrap();

        // The code is free again once its holder is in the recycle bin.
        repo.create(&new_drug("D100", 3), &pharm).await.unwrap();

        let err = repo.transition(&old.id, DrugAction::Restore, &pharm).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(repo.get_drug(&old.id).await.unwrap().unwrap().is_deleted);
    }

    #[tokio::test]
    async fn test_purge_removes_history() {
        let (db, admin, pharm) = setup().await;
        let repo = db.drugs();
        let drug = repo.create(&new_drug("D100", 10), &pharm).await.unwrap();
        repo.update(
            &drug.id,
            &DrugPatch {
                stock: Some(4),
                ..Default::default()
            },
            &pharm,
        )
        .await
        .unwrap();

        let err = repo.transition(&drug.id, DrugAction::Purge, &pharm).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::AdminRequired { .. })));

        let outcome = repo.transition(&drug.id, DrugAction::Purge, &admin).await.unwrap();
        assert!(matches!(outcome, TransitionOutcome::Purged { .. }));
        assert!(repo.get(&drug.id).await.unwrap().is_none());
        assert!(repo.history(&drug.id).await.unwrap().is_empty());

        let err = repo.transition(&drug.id, DrugAction::Delete, &admin).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_batch_delete_skips_locked() {
        let (db, admin, pharm) = setup().await;
        let repo = db.drugs();
        let a = repo.create(&new_drug("A1", 10), &pharm).await.unwrap();
        let b = repo.create(&new_drug("B1", 10), &pharm).await.unwrap();
        repo.transition(&b.id, DrugAction::ToggleLock, &admin).await.unwrap();

        let outcome = repo
            .batch_delete(&[a.id.clone(), b.id.clone(), "ghost".to_string()], &pharm)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            BatchDeleteOutcome {
                deleted: 1,
                skipped_locked: 1,
                skipped_missing: 1,
            }
        );
        assert!(repo.get_drug(&a.id).await.unwrap().unwrap().is_deleted);
        assert!(!repo.get_drug(&b.id).await.unwrap().unwrap().is_deleted);

        let err = repo.batch_delete(&[], &pharm).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_low_stock() {
        let (db, _, pharm) = setup().await;
        let repo = db.drugs();
        repo.create(&new_drug("LOW", 5), &pharm).await.unwrap();
        repo.create(&new_drug("OK", 6), &pharm).await.unwrap();
        let gone = repo.create(&new_drug("GONE", 0), &pharm).await.unwrap();
        repo.transition(&gone.id, DrugAction::Delete, &pharm).await.unwrap();

        let low = repo.low_stock().await.unwrap();
        let codes: Vec<_> = low.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["LOW"]);
    }
}
