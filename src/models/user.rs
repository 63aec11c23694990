use crate::services::validation::{check_email, check_text, FieldErrors, Validate};
use serde::{Deserialize, Serialize};

pub const EMAIL_MAX_LENGTH: usize = 150;
pub const FULL_NAME_MAX_LENGTH: usize = 150;
pub const PASSWORD_MAX_LENGTH: usize = 254;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: String,
    pub created_at: String,
    pub updated_at: String,
}

/// What `GET /auth/me` returns.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub date_joined: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_active: user.is_active,
            date_joined: user.date_joined.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Validate for LoginRequest {
    fn validate(&self, _partial: bool) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, "email", self.email.as_deref(), EMAIL_MAX_LENGTH);
        check_text(
            &mut errors,
            "password",
            self.password.as_deref(),
            true,
            Some(PASSWORD_MAX_LENGTH),
        );
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self, _partial: bool) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, "email", self.email.as_deref(), EMAIL_MAX_LENGTH);
        check_text(
            &mut errors,
            "password",
            self.password.as_deref(),
            true,
            Some(PASSWORD_MAX_LENGTH),
        );
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if let Some(value) = value.as_deref() {
                if value.chars().count() > FULL_NAME_MAX_LENGTH {
                    errors.add(
                        field,
                        format!(
                            "Ensure this field has no more than {} characters.",
                            FULL_NAME_MAX_LENGTH
                        ),
                    );
                }
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

impl Validate for RefreshRequest {
    fn validate(&self, _partial: bool) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "refresh", self.refresh.as_deref(), true, None);
        errors.into_result()
    }
}
