use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{LoginRequest, PublicUser, RegisterRequest, UpdateProfileRequest};
use super::repo_types::{NewUser, User};
use crate::{error::AppError, state::AppState};

pub(crate) const INVALID_CREDENTIALS: &str = "Invalid email or password";
const USER_NOT_FOUND: &str = "User not found";
const MIN_PASSWORD_LEN: usize = 8;

/// Outcome of a successful register or login: the token goes into the
/// cookie, the profile into the body.
#[derive(Debug)]
pub struct Session {
    pub user: PublicUser,
    pub token: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::invalid("Invalid email"));
    }
    Ok(email)
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::invalid(format!("{field} is required"))),
    }
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::invalid("Password too short"));
    }
    Ok(())
}

fn check_measure(value: Option<f64>, field: &str) -> Result<Option<f64>, AppError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            Err(AppError::invalid(format!("{field} must be a non-negative number")))
        }
        other => Ok(other),
    }
}

async fn hash_password(state: &AppState, plain: String) -> Result<String, AppError> {
    let passwords = state.passwords.clone();
    let hash = tokio::task::spawn_blocking(move || passwords.hash(&plain))
        .await
        .map_err(anyhow::Error::from)??;
    Ok(hash)
}

async fn verify_password(state: &AppState, plain: String, hash: Option<String>) -> Result<bool, AppError> {
    let passwords = state.passwords.clone();
    let ok = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => passwords.verify(&plain, &hash),
        None => passwords.verify_dummy(&plain),
    })
    .await
    .map_err(anyhow::Error::from)?;
    Ok(ok)
}

fn open_session(state: &AppState, user: User) -> Result<Session, AppError> {
    let token = state.keys.issue(user.id)?;
    Ok(Session {
        user: user.into(),
        token,
    })
}

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<Session, AppError> {
    let name = required(req.name, "Name")?;
    let email = normalize_email(&required(req.email, "Email")?)?;
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::invalid("Password is required"))?;
    check_password(&password)?;
    let user_type = req
        .user_type
        .ok_or_else(|| AppError::invalid("User type is required"))?;
    let mobile = required(req.mobile, "Mobile")?;
    let height = check_measure(req.height.flatten(), "Height")?;
    let weight = check_measure(req.weight.flatten(), "Weight")?;

    let password_hash = hash_password(state, password).await?;
    let user = state
        .users
        .insert(NewUser {
            name,
            email,
            password_hash,
            user_type,
            mobile,
            height,
            weight,
            birthday: req.birthday.flatten(),
        })
        .await
        .inspect_err(|e| warn!(error = %e, "register rejected by store"))?;

    info!(user_id = %user.id, user_type = %user.user_type, "user registered");
    open_session(state, user)
}

pub async fn login(state: &AppState, req: LoginRequest) -> Result<Session, AppError> {
    // Missing credentials fail exactly like wrong ones.
    let (Some(email), Some(password)) = (
        req.email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        warn!("login without credentials");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    };

    let user = state.users.find_by_email(&email).await?;
    let hash = user.as_ref().map(|u| u.password_hash.clone());
    let ok = verify_password(state, password, hash).await?;

    match user {
        Some(user) if ok => {
            info!(user_id = %user.id, "user logged in");
            open_session(state, user)
        }
        _ => {
            warn!("login failed");
            Err(AppError::Unauthorized(INVALID_CREDENTIALS))
        }
    }
}

pub async fn get_profile(state: &AppState, user_id: Uuid) -> Result<PublicUser, AppError> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .map(PublicUser::from)
        .ok_or(AppError::NotFound(USER_NOT_FOUND))
}

pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    patch: UpdateProfileRequest,
) -> Result<PublicUser, AppError> {
    let mut user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound(USER_NOT_FOUND))?;

    if let Some(name) = patch.name {
        user.name = required(Some(name), "Name")?;
    }
    if let Some(email) = patch.email {
        user.email = normalize_email(&email)?;
    }
    if let Some(mobile) = patch.mobile {
        user.mobile = required(Some(mobile), "Mobile")?;
    }
    if let Some(user_type) = patch.user_type {
        user.user_type = user_type;
    }
    if let Some(height) = patch.height {
        user.height = check_measure(height, "Height")?;
    }
    if let Some(weight) = patch.weight {
        user.weight = check_measure(weight, "Weight")?;
    }
    if let Some(birthday) = patch.birthday {
        user.birthday = birthday;
    }
    if let Some(password) = patch.password.filter(|p| !p.is_empty()) {
        check_password(&password)?;
        user.password_hash = hash_password(state, password).await?;
    }

    let updated = state
        .users
        .update(&user)
        .await?
        .ok_or(AppError::NotFound(USER_NOT_FOUND))?;
    info!(user_id = %updated.id, "profile updated");
    Ok(updated.into())
}

pub async fn delete_profile(state: &AppState, user_id: Uuid) -> Result<(), AppError> {
    if !state.users.delete(user_id).await? {
        return Err(AppError::NotFound(USER_NOT_FOUND));
    }
    info!(user_id = %user_id, "user deleted");
    Ok(())
}

pub async fn list_users(state: &AppState) -> Result<Vec<PublicUser>, AppError> {
    let users = state.users.list().await?;
    Ok(users.into_iter().map(PublicUser::from).collect())
}

/// Grants the administrator flag to every listed email that has an account.
pub async fn promote_admins(state: &AppState, emails: &[String]) -> Result<usize, AppError> {
    let mut promoted = 0;
    for email in emails {
        match state.users.find_by_email(email).await? {
            Some(user) if user.is_admin => {}
            Some(user) => {
                if state.users.set_admin(user.id, true).await? {
                    info!(user_id = %user.id, "promoted to administrator");
                    promoted += 1;
                }
            }
            None => warn!(email = %email, "admin email has no account"),
        }
    }
    Ok(promoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::UserType;

    fn registration(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some("Jordan".into()),
            email: Some(email.into()),
            password: Some(password.into()),
            user_type: Some(UserType::Member),
            mobile: Some("0412345678".into()),
            height: Some(Some(180.0)),
            weight: Some(Some(75.5)),
            birthday: None,
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@b.co"));
        assert!(!is_valid_email("spaces in@b.co"));
    }

    #[tokio::test]
    async fn register_normalizes_email_and_is_not_admin() {
        let state = AppState::fake();
        let session = register(&state, registration("  Jordan@Gym.IO ", "hunter2hunter2"))
            .await
            .unwrap();
        assert_eq!(session.user.email, "jordan@gym.io");
        assert!(!session.user.is_admin);
        assert!(!session.token.is_empty());
        let claims = state.keys.verify(&session.token).unwrap();
        assert_eq!(claims.sub, session.user.id);
    }

    #[tokio::test]
    async fn register_rejects_missing_fields() {
        let state = AppState::fake();
        let mut req = registration("x@gym.io", "hunter2hunter2");
        req.mobile = Some("   ".into());
        assert!(matches!(
            register(&state, req).await,
            Err(AppError::InvalidInput(_))
        ));

        let mut req = registration("x@gym.io", "hunter2hunter2");
        req.user_type = None;
        assert!(matches!(
            register(&state, req).await,
            Err(AppError::InvalidInput(_))
        ));

        assert!(matches!(
            register(&state, registration("x@gym.io", "short")).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(state.users.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let state = AppState::fake();
        register(&state, registration("dup@gym.io", "hunter2hunter2")).await.unwrap();
        let err = register(&state, registration("DUP@gym.io", "another-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(state.users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let state = AppState::fake();
        register(&state, registration("real@gym.io", "hunter2hunter2")).await.unwrap();

        let wrong_pw = login(&state, login_req("real@gym.io", "nope-nope-nope"))
            .await
            .unwrap_err();
        let no_user = login(&state, login_req("ghost@gym.io", "hunter2hunter2"))
            .await
            .unwrap_err();
        assert_eq!(wrong_pw.status(), no_user.status());
        assert_eq!(wrong_pw.to_string(), no_user.to_string());
        assert_eq!(wrong_pw.to_string(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn login_without_credentials_matches_bad_credentials() {
        let state = AppState::fake();
        let bad = login(&state, login_req("nobody@gym.io", "whatever-pass"))
            .await
            .unwrap_err();
        let cases = [
            LoginRequest::default(),
            LoginRequest {
                email: None,
                password: Some("whatever-pass".into()),
            },
            LoginRequest {
                email: Some("  ".into()),
                password: Some("whatever-pass".into()),
            },
            LoginRequest {
                email: Some("nobody@gym.io".into()),
                password: Some(String::new()),
            },
        ];
        for req in cases {
            let err = login(&state, req).await.unwrap_err();
            assert!(matches!(err, AppError::Unauthorized(INVALID_CREDENTIALS)));
            assert_eq!(err.status(), bad.status());
            assert_eq!(err.to_string(), bad.to_string());
        }
    }

    #[tokio::test]
    async fn login_returns_registered_profile() {
        let state = AppState::fake();
        let registered = register(&state, registration("rt@gym.io", "hunter2hunter2"))
            .await
            .unwrap();
        let logged_in = login(&state, login_req(" RT@gym.io", "hunter2hunter2"))
            .await
            .unwrap();
        assert_eq!(registered.user, logged_in.user);
    }

    #[tokio::test]
    async fn partial_update_keeps_omitted_fields() {
        let state = AppState::fake();
        let session = register(&state, registration("keep@gym.io", "hunter2hunter2"))
            .await
            .unwrap();
        let before = session.user;

        let patch = UpdateProfileRequest {
            name: Some("X".into()),
            ..Default::default()
        };
        let after = update_profile(&state, before.id, patch).await.unwrap();
        assert_eq!(after.name, "X");
        assert_eq!(after.email, before.email);
        assert_eq!(after.user_type, before.user_type);
        assert_eq!(after.mobile, before.mobile);
        assert_eq!(after.height, before.height);
        assert_eq!(after.weight, before.weight);
        assert_eq!(after.birthday, before.birthday);
    }

    // A bare `value || existing` merge would ignore 0 and null here.
    #[tokio::test]
    async fn falsy_values_are_applied_not_ignored() {
        let state = AppState::fake();
        let session = register(&state, registration("falsy@gym.io", "hunter2hunter2"))
            .await
            .unwrap();
        let patch = UpdateProfileRequest {
            height: Some(Some(0.0)),
            weight: Some(None),
            ..Default::default()
        };
        let after = update_profile(&state, session.user.id, patch).await.unwrap();
        assert_eq!(after.height, Some(0.0));
        assert_eq!(after.weight, None);
    }

    #[tokio::test]
    async fn blank_required_field_is_rejected() {
        let state = AppState::fake();
        let session = register(&state, registration("blank@gym.io", "hunter2hunter2"))
            .await
            .unwrap();
        let patch = UpdateProfileRequest {
            name: Some("".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_profile(&state, session.user.id, patch).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn password_change_rehashes() {
        let state = AppState::fake();
        let session = register(&state, registration("pw@gym.io", "old-password"))
            .await
            .unwrap();
        let patch = UpdateProfileRequest {
            password: Some("new-password".into()),
            ..Default::default()
        };
        update_profile(&state, session.user.id, patch).await.unwrap();

        assert!(login(&state, login_req("pw@gym.io", "old-password")).await.is_err());
        assert!(login(&state, login_req("pw@gym.io", "new-password")).await.is_ok());
        let stored = state.users.find_by_id(session.user.id).await.unwrap().unwrap();
        assert!(!stored.password_hash.contains("new-password"));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let state = AppState::fake();
        let id = Uuid::new_v4();
        assert!(matches!(get_profile(&state, id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            update_profile(&state, id, UpdateProfileRequest::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(delete_profile(&state, id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn promote_admins_sets_flag_for_known_accounts() {
        let state = AppState::fake();
        let session = register(&state, registration("boss@gym.io", "hunter2hunter2"))
            .await
            .unwrap();
        let promoted = promote_admins(&state, &["boss@gym.io".into(), "nobody@gym.io".into()])
            .await
            .unwrap();
        assert_eq!(promoted, 1);
        assert!(get_profile(&state, session.user.id).await.unwrap().is_admin);
        assert_eq!(promote_admins(&state, &["boss@gym.io".into()]).await.unwrap(), 0);
    }
}
