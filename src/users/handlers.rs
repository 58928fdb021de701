use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{LoginRequest, MessageResponse, PublicUser, RegisterRequest, UpdateProfileRequest},
    services,
};
use crate::{
    auth::{
        cookies::{cleared_cookie, session_cookie},
        extractors::{AdminUser, AuthUser},
    },
    error::AppError,
    state::AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(register_user).delete(delete_own_profile))
        .route("/auth", post(login_user))
        .route("/logout", post(logout_user))
        .route("/profile", get(get_own_profile).put(update_own_profile))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(list_users))
        .route(
            "/specific/:id",
            get(admin_get_profile).put(admin_update_profile),
        )
        .route("/:id", delete(admin_delete_user))
}

fn with_session(
    state: &AppState,
    status: StatusCode,
    session: services::Session,
) -> Result<impl IntoResponse, AppError> {
    let cookie = session_cookie(&state.config.cookie, &session.token, state.keys.ttl())?;
    Ok((status, [(header::SET_COOKIE, cookie)], Json(session.user)))
}

fn target_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::NotFound("User not found"))
}

#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let session = services::register(&state, payload).await?;
    with_session(&state, StatusCode::CREATED, session)
}

#[instrument(skip(state, payload))]
pub async fn login_user(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let session = services::login(&state, payload).await?;
    with_session(&state, StatusCode::OK, session)
}

/// Clears the cookie only; a copied token stays valid until it expires.
#[instrument(skip(state))]
pub async fn logout_user(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let cookie = cleared_cookie(&state.config.cookie)?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_own_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    Ok(Json(services::get_profile(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_own_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(services::update_profile(&state, user_id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_own_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    services::delete_profile(&state, user_id).await?;
    let cookie = cleared_cookie(&state.config.cookie)?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "User account deleted",
        }),
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn list_users(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    Ok(Json(services::list_users(&state).await?))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn admin_get_profile(
    State(state): State<AppState>,
    admin: AdminUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let id = target_id(path)?;
    Ok(Json(services::get_profile(&state, id).await?))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.0.id))]
pub async fn admin_update_profile(
    State(state): State<AppState>,
    admin: AdminUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let id = target_id(path)?;
    let Json(payload) = payload?;
    let user = services::update_profile(&state, id, payload).await?;
    info!(target_id = %id, "profile updated by admin");
    Ok(Json(user))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn admin_delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = target_id(path)?;
    services::delete_profile(&state, id).await?;
    info!(target_id = %id, "user removed by admin");
    Ok(Json(MessageResponse {
        message: "User removed",
    }))
}
