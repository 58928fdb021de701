use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{User, UserType};

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");

/// Request body for registration. Required fields are optional here so that
/// a missing one surfaces as a 400 with a readable message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub user_type: Option<UserType>,
    pub mobile: Option<String>,
    #[serde(default, deserialize_with = "patch_measure")]
    pub height: Option<Option<f64>>,
    #[serde(default, deserialize_with = "patch_measure")]
    pub weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "patch_date")]
    pub birthday: Option<Option<Date>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Partial profile update.
///
/// An absent key leaves the stored value alone. For the optional attributes
/// (`height`, `weight`, `birthday`) the outer `Option` records presence and
/// the inner one the value, so `null` clears and `0` is kept as `0`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub user_type: Option<UserType>,
    pub mobile: Option<String>,
    #[serde(default, deserialize_with = "patch_measure")]
    pub height: Option<Option<f64>>,
    #[serde(default, deserialize_with = "patch_measure")]
    pub weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "patch_date")]
    pub birthday: Option<Option<Date>>,
}

/// Part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    pub is_admin: bool,
    pub mobile: String,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    #[serde(with = "calendar_date::option")]
    pub birthday: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            user_type: user.user_type,
            is_admin: user.is_admin,
            mobile: user.mobile,
            height: user.height,
            weight: user.weight,
            birthday: user.birthday,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

// Form inputs arrive as numbers or numeric strings; "" and null both clear.
fn patch_measure<'de, D>(d: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<NumberOrText>::deserialize(d)? {
        None => None,
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => None,
        Some(NumberOrText::Text(s)) => Some(
            s.trim()
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("expected a number, got {s:?}")))?,
        ),
    };
    Ok(Some(value))
}

// Accepts `YYYY-MM-DD` or a full timestamp, of which only the date is kept.
fn patch_date<'de, D>(d: D) -> Result<Option<Option<Date>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<String>::deserialize(d)? {
        None => None,
        Some(s) if s.trim().is_empty() => None,
        Some(s) => {
            let day = s.trim().get(..10).unwrap_or(s.trim());
            let format = time::macros::format_description!("[year]-[month]-[day]");
            Some(
                Date::parse(day, &format)
                    .map_err(|_| D::Error::custom(format!("expected a date, got {s:?}")))?,
            )
        }
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn omitted_fields_stay_absent() {
        let req: UpdateProfileRequest = serde_json::from_str(r#"{"name":"X"}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("X"));
        assert!(req.email.is_none());
        assert!(req.height.is_none());
        assert!(req.birthday.is_none());
    }

    #[test]
    fn null_and_zero_are_distinct_from_absent() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"height":0,"weight":null,"birthday":""}"#).unwrap();
        assert_eq!(req.height, Some(Some(0.0)));
        assert_eq!(req.weight, Some(None));
        assert_eq!(req.birthday, Some(None));
    }

    #[test]
    fn measures_accept_numeric_strings() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"height":"182.5","weight":" 80 "}"#).unwrap();
        assert_eq!(req.height, Some(Some(182.5)));
        assert_eq!(req.weight, Some(Some(80.0)));

        let bad = serde_json::from_str::<RegisterRequest>(r#"{"height":"tall"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn birthday_accepts_date_or_timestamp() {
        let a: UpdateProfileRequest =
            serde_json::from_str(r#"{"birthday":"1990-04-12"}"#).unwrap();
        let b: UpdateProfileRequest =
            serde_json::from_str(r#"{"birthday":"1990-04-12T00:00:00.000Z"}"#).unwrap();
        assert_eq!(a.birthday, Some(Some(date!(1990 - 04 - 12))));
        assert_eq!(a.birthday, b.birthday);
    }

    #[test]
    fn public_user_uses_client_field_names_and_hides_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Sam".into(),
            email: "sam@gym.io".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            user_type: UserType::Trainer,
            is_admin: false,
            mobile: "0400".into(),
            height: Some(170.0),
            weight: None,
            birthday: Some(date!(2000 - 01 - 31)),
            created_at: datetime!(2024-05-01 10:00 UTC),
            updated_at: datetime!(2024-05-02 10:00 UTC),
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert_eq!(json["userType"], "Trainer");
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["birthday"], "2000-01-31");
        assert_eq!(json["createdAt"], "2024-05-01T10:00:00Z");
        assert!(json.get("_id").is_some());
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }
}
