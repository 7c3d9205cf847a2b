use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::error::AppError;

pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub profile_image: Option<String>,
    pub is_admin: bool,
    pub is_staff: bool,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub email: String,
    pub username: String,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleUpdate {
    pub is_admin: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_active: Option<bool>,
}

impl User {
    pub fn apply_roles(&mut self, roles: &RoleUpdate) {
        if let Some(is_admin) = roles.is_admin {
            self.is_admin = is_admin;
        }
        if let Some(is_staff) = roles.is_staff {
            self.is_staff = is_staff;
        }
        if let Some(is_active) = roles.is_active {
            self.is_active = is_active;
        }
    }
}

/// Lowercases the domain part, the same way account lookups compare emails.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::ValidationError(format!("'{}' is not a valid email address", email));
    let (local, domain) = email.rsplit_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.len() < 3 || email.len() > 255 {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if username.trim().is_empty() {
        return Err(AppError::ValidationError(
            "username is required".to_string(),
        ));
    }
    if len > USERNAME_MAX_LEN {
        return Err(AppError::ValidationError(format!(
            "username must be at most {} characters",
            USERNAME_MAX_LEN
        )));
    }
    Ok(())
}

pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), AppError> {
    if password != confirmation {
        return Err(AppError::ValidationError(
            "Password fields didn't match.".to_string(),
        ));
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AppError::ValidationError(format!(
            "password must contain at least {} characters",
            PASSWORD_MIN_LEN
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::ValidationError(
            "password is entirely numeric".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        assert_eq!(normalize_email(" Tester@Test.COM "), "Tester@test.com");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("tester@test.com").is_ok());
        assert!(validate_email("tester@localhost").is_err());
        assert!(validate_email("@test.com").is_err());
        assert!(validate_email("tester test@test.com").is_err());
        assert!(validate_email("tester.test.com").is_err());
    }

    #[test]
    fn test_validate_username_length() {
        assert!(validate_username("테스터").is_ok());
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"a".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("qwer@1234", "qwer@1234").is_ok());
        assert!(validate_new_password("qwer@1234", "qwer@12345").is_err());
        assert!(validate_new_password("short1", "short1").is_err());
        assert!(validate_new_password("12345678", "12345678").is_err());
    }

    #[test]
    fn test_apply_roles_only_touches_given_flags() {
        let now = Utc::now();
        let mut user = User {
            id: 1,
            email: "tester@test.com".into(),
            username: "tester".into(),
            password_hash: String::new(),
            profile_image: None,
            is_active: true,
            is_admin: false,
            is_staff: false,
            created_at: now,
            updated_at: now,
        };
        user.apply_roles(&RoleUpdate {
            is_staff: Some(true),
            ..RoleUpdate::default()
        });
        assert!(user.is_staff);
        assert!(!user.is_admin);
        assert!(user.is_active);
    }
}
