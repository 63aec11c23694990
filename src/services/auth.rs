use crate::models::{NewUser, User, EMAIL_MAX_LENGTH};
use crate::services::validation::{is_valid_email, FieldErrors, INVALID_EMAIL};
use crate::Database;
use anyhow::Result;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use rusqlite::{Connection, OptionalExtension};

pub const MIN_PASSWORD_LENGTH: usize = 8;

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, is_active, is_staff, \
                            is_superuser, date_joined, created_at, updated_at";

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Password rules applied on registration and password changes.
pub fn validate_password(password: &str) -> Result<(), FieldErrors> {
    let trimmed = password.trim();
    if trimmed.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(FieldErrors::single(
            "password",
            format!(
                "Password must be at least {} characters long.",
                MIN_PASSWORD_LENGTH
            ),
        ));
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldErrors::single(
            "password",
            "This password is entirely numeric.",
        ));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String> {
    validate_password(password)?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dW5rbm93bg$0000000000000000000000000000000000000000000";

pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => {
            if let Ok(dummy) = PasswordHash::new(DUMMY_HASH) {
                let _ = Argon2::default().verify_password(password.as_bytes(), &dummy);
            }
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        is_active: row.get(5)?,
        is_staff: row.get(6)?,
        is_superuser: row.get(7)?,
        date_joined: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn email_taken(conn: &Connection, email: &str) -> Result<bool> {
    let taken = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)",
        [email],
        |row| row.get(0),
    )?;
    Ok(taken)
}

pub fn create_user(db: &Database, new_user: &NewUser) -> Result<User> {
    let email = normalize_email(&new_user.email);
    if email.is_empty() {
        return Err(FieldErrors::single("email", "Email field is required").into());
    }
    if email.chars().count() > EMAIL_MAX_LENGTH || !is_valid_email(&email) {
        return Err(FieldErrors::single("email", INVALID_EMAIL).into());
    }

    let conn = db.get()?;
    let mut errors = FieldErrors::new();
    if email_taken(&conn, &email)? {
        errors.add("email", format!("User with email '{}' already exists.", email));
    }
    if let Err(rejected) = validate_password(&new_user.password) {
        for message in rejected.get("password").unwrap_or_default() {
            errors.add("password", message.as_str());
        }
    }
    errors.into_result()?;

    let password_hash = hash_password(&new_user.password)?;

    conn.execute(
        "INSERT INTO users (email, password_hash, first_name, last_name, is_staff, is_superuser, is_active)
         VALUES (?, ?, ?, ?, ?, ?, 1)",
        (
            &email,
            &password_hash,
            new_user.first_name.trim(),
            new_user.last_name.trim(),
            new_user.is_staff || new_user.is_superuser,
            new_user.is_superuser,
        ),
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(user_id = id, "User registered");

    let user = conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
        [id],
        row_to_user,
    )?;
    Ok(user)
}

/// Checks login credentials. Failures come back as `FieldErrors` naming the
/// offending field.
pub fn authenticate(db: &Database, email: &str, password: &str) -> Result<User> {
    let email = normalize_email(email);
    let user = find_by_email(db, &email)?;

    let user = match user {
        Some(u) => u,
        None => {
            // Keep timing close to the found-user path.
            verify_password(password, DUMMY_HASH);
            return Err(FieldErrors::single(
                "email",
                format!("User with email '{}' does not exist.", email),
            )
            .into());
        }
    };

    if !verify_password(password, &user.password_hash) {
        return Err(FieldErrors::single("password", "Incorrect password.").into());
    }
    if !user.is_active {
        return Err(FieldErrors::single("email", "User account is disabled.").into());
    }

    Ok(user)
}

pub fn find_by_email(db: &Database, email: &str) -> Result<Option<User>> {
    let conn = db.get()?;
    let user = conn
        .query_row(
            &format!(
                "SELECT {} FROM users WHERE email = ? AND deleted_at IS NULL",
                USER_COLUMNS
            ),
            [normalize_email(email)],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn get_user(db: &Database, id: i64) -> Result<Option<User>> {
    let conn = db.get()?;
    let user = conn
        .query_row(
            &format!(
                "SELECT {} FROM users WHERE id = ? AND deleted_at IS NULL",
                USER_COLUMNS
            ),
            [id],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn list_users(db: &Database) -> Result<Vec<User>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users WHERE deleted_at IS NULL ORDER BY id",
        USER_COLUMNS
    ))?;
    let users = stmt
        .query_map([], row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

pub fn has_users(db: &Database) -> Result<bool> {
    let conn = db.get()?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE deleted_at IS NULL",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Returns false when no live user has that email.
pub fn set_active(db: &Database, email: &str, active: bool) -> Result<bool> {
    let conn = db.get()?;
    let affected = conn.execute(
        "UPDATE users SET is_active = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
         WHERE email = ? AND deleted_at IS NULL",
        (active, normalize_email(email)),
    )?;
    Ok(affected > 0)
}

/// Returns false when no live user has that email.
pub fn update_password(db: &Database, email: &str, password: &str) -> Result<bool> {
    let password_hash = hash_password(password)?;
    let conn = db.get()?;
    let affected = conn.execute(
        "UPDATE users SET password_hash = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
         WHERE email = ? AND deleted_at IS NULL",
        (&password_hash, normalize_email(email)),
    )?;
    Ok(affected > 0)
}

/// Soft deletes the user. Returns false when no live user has that email.
pub fn soft_delete_user(db: &Database, email: &str) -> Result<bool> {
    let conn = db.get()?;
    let affected = conn.execute(
        "UPDATE users SET deleted_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
         WHERE email = ? AND deleted_at IS NULL",
        [normalize_email(email)],
    )?;
    Ok(affected > 0)
}
