use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::{StoreError, UserStore};
use super::repo_types::{NewUser, User};

#[derive(Default)]
struct Inner {
    by_id: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

/// Process-local user store. Uniqueness is checked and applied under a single
/// write lock, so concurrent registrations cannot both win.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, new: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_email.contains_key(&new.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            user_type: new.user_type,
            is_admin: false,
            mobile: new.mobile,
            height: new.height,
            weight: new.weight,
            birthday: new.birthday,
            created_at: now,
            updated_at: now,
        };
        inner.by_email.insert(user.email.clone(), user.id);
        inner.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_email
            .get(email)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.inner.read().await.by_id.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(current) = inner.by_id.get(&user.id).cloned() else {
            return Ok(None);
        };
        if current.email != user.email {
            if inner.by_email.contains_key(&user.email) {
                return Err(StoreError::DuplicateEmail);
            }
            inner.by_email.remove(&current.email);
            inner.by_email.insert(user.email.clone(), user.id);
        }
        let updated = User {
            is_admin: current.is_admin,
            created_at: current.created_at,
            updated_at: OffsetDateTime::now_utc(),
            ..user.clone()
        };
        inner.by_id.insert(updated.id, updated.clone());
        Ok(Some(updated))
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.by_id.get_mut(&id) {
            Some(user) => {
                user.is_admin = is_admin;
                user.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.by_id.remove(&id) {
            Some(user) => {
                inner.by_email.remove(&user.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
