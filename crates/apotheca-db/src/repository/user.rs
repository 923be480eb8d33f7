//! # User Repository
//!
//! Staff accounts. Password hashes are produced by [`crate::password`];
//! this module only stores and fetches them.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use apotheca_core::{Role, User};

const USER_COLUMNS: &str = "id, username, password_hash, name, role, created_at";

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    /// Already hashed.
    pub password_hash: Option<String>,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        debug!(id = %id, "Getting user by ID");

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        debug!(username = %username, "Getting user by username");

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Creates an account.
    ///
    /// ## Errors
    /// `UniqueViolation` if the username is taken.
    pub async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        name: &str,
        role: Role,
    ) -> DbResult<User> {
        debug!(username = %username, role = %role, "Inserting user");

        if self.find_by_username(username).await?.is_some() {
            return Err(DbError::duplicate("username", username));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            name: name.trim().to_string(),
            role,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, name, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
            other => other,
        })?;

        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Applies a profile update and returns the fresh row.
    pub async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> DbResult<User> {
        debug!(id = %id, "Updating user profile");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?2, name),
                password_hash = COALESCE(?3, password_hash)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.password_hash.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn setup() -> UserRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().users()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = setup().await;
        let user = repo
            .insert("pharm", "$argon2id$hash", "Pat Pharmacist", Role::Pharmacist)
            .await
            .unwrap();

        let found = repo.find_by_username("pharm").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.role, Role::Pharmacist);
        assert_eq!(found.password_hash, "$argon2id$hash");

        assert!(repo.get_by_id(&user.id).await.unwrap().is_some());
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let repo = setup().await;
        repo.insert("admin", "h", "Admin", Role::Admin).await.unwrap();
        let err = repo.insert("admin", "h", "Other", Role::Pharmacist).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { field, .. } if field == "username"));
    }

    #[tokio::test]
    async fn test_update_profile_keeps_unset_fields() {
        let repo = setup().await;
        let user = repo.insert("pharm", "old-hash", "Pat", Role::Pharmacist).await.unwrap();

        let updated = repo
            .update_profile(
                &user.id,
                &ProfileUpdate {
                    name: Some("Patricia".to_string()),
                    password_hash: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Patricia");
        assert_eq!(updated.password_hash, "old-hash");

        let err = repo
            .update_profile("missing", &ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
