use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{NewUser, User, UserRow};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::DuplicateEmail;
            }
        }
        StoreError::Backend(err.into())
    }
}

/// Persistence for user accounts.
///
/// Implementations own the email uniqueness constraint: `insert` and `update`
/// must fail with [`StoreError::DuplicateEmail`] rather than rely on callers
/// checking first. `update` writes every mutable field except `is_admin`,
/// which only `set_admin` touches.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    /// Returns `None` when the id no longer resolves.
    async fn update(&self, user: &User) -> Result<Option<User>, StoreError>;
    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<bool, StoreError>;
    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

const USER_COLUMNS: &str = "id, name, email, password_hash, user_type, is_admin, mobile, \
                            height, weight, birthday, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_user(row: UserRow) -> Result<User, StoreError> {
    User::try_from(row).map_err(StoreError::Backend)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, user_type, mobile, height, weight, birthday)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.user_type.as_str())
        .bind(&user.mobile)
        .bind(user.height)
        .bind(user.weight)
        .bind(user.birthday)
        .fetch_one(&self.db)
        .await?;
        into_user(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(into_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        row.map(into_user).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(into_user).collect()
    }

    async fn update(&self, user: &User) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, user_type = $5, mobile = $6,
                height = $7, weight = $8, birthday = $9, updated_at = $10
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.user_type.as_str())
        .bind(&user.mobile)
        .bind(user.height)
        .bind(user.weight)
        .bind(user.birthday)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(&self.db)
        .await?;
        row.map(into_user).transpose()
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET is_admin = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(is_admin)
            .bind(OffsetDateTime::now_utc())
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
