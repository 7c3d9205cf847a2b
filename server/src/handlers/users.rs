use axum::extract::State;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, require_admin, verify_password, AuthUser, TokenType};
use crate::config::AdminSeed;
use crate::db::{RepoError, Repository};
use crate::models::event::EventSummary;
use crate::models::store::Store;
use crate::models::user::{
    normalize_email, validate_email, validate_new_password, validate_username, NewUser,
    ProfileUpdate, RoleUpdate, User,
};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password2: String,
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub password: String,
    pub password2: String,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub bookmark_stores: Vec<Store>,
    pub bookmark_events: Vec<EventSummary>,
}

pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<Response, AppError> {
    let email = normalize_email(&payload.email);
    validate_email(&email)?;
    let username = payload.username.trim().to_string();
    validate_username(&username)?;
    validate_new_password(&payload.password, &payload.password2)?;

    let user = state
        .repo
        .create_user(NewUser {
            email,
            username,
            password_hash: hash_password(&payload.password).await?,
            profile_image: payload.profile_image,
            is_admin: false,
            is_staff: false,
        })
        .await?;

    tracing::info!(user_id = user.id, "User signed up");
    Ok(created(user, "Signup complete"))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Response, AppError> {
    let invalid = || AppError::AuthError("No active account found with the given credentials".to_string());

    let user = state
        .repo
        .find_user_by_email(&normalize_email(&payload.email))
        .await?
        .ok_or_else(invalid)?;

    let matches = verify_password(&payload.password, &user.password_hash).await?;
    if !user.is_active || !matches {
        return Err(invalid());
    }

    let tokens = state.tokens.issue_pair(&user)?;
    Ok(success(tokens, "Login successful"))
}

pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Response, AppError> {
    let claims = state.tokens.decode(&payload.refresh, TokenType::Refresh)?;
    if state.repo.is_token_revoked(claims.jti).await? {
        return Err(AppError::AuthError("Token is blacklisted".to_string()));
    }

    let user = match state.repo.get_user(claims.sub).await {
        Ok(user) => user,
        Err(RepoError::NotFound(_)) => {
            return Err(AppError::AuthError("User no longer exists".to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    if !user.is_active {
        return Err(AppError::AuthError("User account is disabled".to_string()));
    }

    let access = state.tokens.issue(&user, TokenType::Access)?;
    Ok(success(AccessToken { access }, "Token refreshed"))
}

pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Response, AppError> {
    let claims = state.tokens.decode(&payload.refresh, TokenType::Refresh)?;
    if claims.sub != user.id {
        return Err(AppError::Forbidden(
            "Refresh token belongs to another user".to_string(),
        ));
    }

    state.repo.revoke_token(claims.jti, claims.expires_at()).await?;
    tracing::info!(user_id = user.id, "User logged out");
    Ok(empty_success("Logged out"))
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Response, AppError> {
    let bookmark_stores = state.repo.bookmarked_stores(user.id).await?;
    let bookmark_events = state
        .repo
        .bookmarked_events(user.id)
        .await?
        .iter()
        .map(EventSummary::from)
        .collect();

    Ok(success(
        Profile {
            user,
            bookmark_stores,
            bookmark_events,
        },
        "Profile retrieved",
    ))
}

pub async fn modify_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<ProfileRequest>,
) -> Result<Response, AppError> {
    let email = match payload.email {
        Some(email) => normalize_email(&email),
        None => user.email.clone(),
    };
    validate_email(&email)?;
    let username = match payload.username {
        Some(username) => username.trim().to_string(),
        None => user.username.clone(),
    };
    validate_username(&username)?;

    let updated = state
        .repo
        .update_profile(
            user.id,
            ProfileUpdate {
                email,
                username,
                profile_image: payload.profile_image.or(user.profile_image),
            },
        )
        .await?;

    Ok(success(updated, "Profile updated"))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(user_id): AppPath<i64>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Response, AppError> {
    if user.id != user_id {
        return Err(AppError::Forbidden(
            "You can only change your own password".to_string(),
        ));
    }
    if !verify_password(&payload.old_password, &user.password_hash).await? {
        return Err(AppError::ValidationError(
            "Old password is not correct".to_string(),
        ));
    }
    validate_new_password(&payload.password, &payload.password2)?;

    let password_hash = hash_password(&payload.password).await?;
    state.repo.update_password(user.id, password_hash).await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(empty_success("Password changed"))
}

pub async fn set_roles(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    AppPath(user_id): AppPath<i64>,
    AppJson(roles): AppJson<RoleUpdate>,
) -> Result<Response, AppError> {
    require_admin(&admin)?;
    let user = state.repo.update_roles(user_id, roles).await?;
    tracing::info!(
        admin_id = admin.id,
        user_id,
        is_admin = user.is_admin,
        is_staff = user.is_staff,
        is_active = user.is_active,
        "Roles updated"
    );
    Ok(success(user, "Roles updated"))
}

/// Creates the configured superuser unless an account with that email exists.
pub async fn ensure_superuser(repo: &dyn Repository, seed: &AdminSeed) -> Result<(), AppError> {
    let email = normalize_email(&seed.email);
    validate_email(&email)?;
    validate_username(&seed.username)?;

    if repo.find_user_by_email(&email).await?.is_some() {
        tracing::debug!(email = %email, "Superuser already exists");
        return Ok(());
    }

    let user = repo
        .create_user(NewUser {
            email,
            username: seed.username.trim().to_string(),
            password_hash: hash_password(&seed.password).await?,
            profile_image: None,
            is_admin: true,
            is_staff: true,
        })
        .await?;
    tracing::info!(user_id = user.id, "Created superuser");
    Ok(())
}
