use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Account kind; orthogonal to the administrator flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserType {
    Guest,
    Member,
    Trainer,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Guest => "Guest",
            UserType::Member => "Member",
            UserType::Trainer => "Trainer",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Guest" => Ok(UserType::Guest),
            "Member" => Ok(UserType::Member),
            "Trainer" => Ok(UserType::Trainer),
            other => anyhow::bail!("unknown user type {other:?}"),
        }
    }
}

/// User record as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string, never serialized
    pub user_type: UserType,
    pub is_admin: bool,
    pub mobile: String,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub birthday: Option<Date>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields supplied on registration; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub user_type: UserType,
    pub mobile: String,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub birthday: Option<Date>,
}

/// Row shape of the `users` table.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub user_type: String,
    pub is_admin: bool,
    pub mobile: String,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub birthday: Option<Date>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            user_type: row.user_type.parse()?,
            is_admin: row.is_admin,
            mobile: row.mobile,
            height: row.height,
            weight: row.weight,
            birthday: row.birthday,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
