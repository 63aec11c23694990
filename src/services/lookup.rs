use crate::models::{Category, Post, Tag, Taxonomy};
use crate::services::validation::FieldErrors;
use crate::services::{posts, taxonomy};
use crate::Database;
use anyhow::Result;

/// A resource addressed by a path key.
pub trait Lookup: Sized {
    const ENTITY: &'static str;
    /// Field name the failure is reported under.
    const KEY_FIELD: &'static str;
    /// How the key reads in messages, e.g. `ID` or `slug`.
    const KEY_LABEL: &'static str;

    fn is_well_formed(_key: &str) -> bool {
        true
    }

    /// Live rows matching the key, at most two.
    fn find_live(db: &Database, key: &str) -> Result<Vec<Self>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFailure {
    Malformed,
    NotFound,
    Multiple,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct LookupError {
    pub failure: LookupFailure,
    pub field: &'static str,
    pub message: String,
}

impl LookupError {
    fn new<T: Lookup>(failure: LookupFailure, key: &str) -> Self {
        let message = match failure {
            LookupFailure::Malformed => format!("{} {} must be a number.", T::ENTITY, T::KEY_LABEL),
            LookupFailure::NotFound => format!(
                "{} with {} {} hasn't been found.",
                T::ENTITY,
                T::KEY_LABEL,
                key
            ),
            LookupFailure::Multiple => format!(
                "Multiple {} objects returned for {} {}.",
                T::ENTITY,
                T::KEY_LABEL,
                key
            ),
        };
        Self {
            failure,
            field: T::KEY_FIELD,
            message,
        }
    }

    pub fn field_errors(&self) -> FieldErrors {
        FieldErrors::single(self.field, self.message.clone())
    }
}

/// Resolves exactly one live row for `key`, or a `LookupError` inside the
/// returned error.
pub fn find_one<T: Lookup>(db: &Database, key: &str) -> Result<T> {
    if !T::is_well_formed(key) {
        return Err(LookupError::new::<T>(LookupFailure::Malformed, key).into());
    }
    let mut rows = T::find_live(db, key)?;
    match rows.len() {
        0 => Err(LookupError::new::<T>(LookupFailure::NotFound, key).into()),
        1 => Ok(rows.remove(0)),
        _ => Err(LookupError::new::<T>(LookupFailure::Multiple, key).into()),
    }
}

fn is_numeric_id(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_digit())
}

fn find_term<T: Taxonomy>(db: &Database, key: &str) -> Result<Vec<T>> {
    // Digits too large for an i64 cannot match any row.
    match key.parse::<i64>() {
        Ok(id) => taxonomy::find_live::<T>(db, id),
        Err(_) => Ok(Vec::new()),
    }
}

impl Lookup for Category {
    const ENTITY: &'static str = <Category as Taxonomy>::ENTITY;
    const KEY_FIELD: &'static str = "id";
    const KEY_LABEL: &'static str = "ID";

    fn is_well_formed(key: &str) -> bool {
        is_numeric_id(key)
    }

    fn find_live(db: &Database, key: &str) -> Result<Vec<Self>> {
        find_term(db, key)
    }
}

impl Lookup for Tag {
    const ENTITY: &'static str = <Tag as Taxonomy>::ENTITY;
    const KEY_FIELD: &'static str = "id";
    const KEY_LABEL: &'static str = "ID";

    fn is_well_formed(key: &str) -> bool {
        is_numeric_id(key)
    }

    fn find_live(db: &Database, key: &str) -> Result<Vec<Self>> {
        find_term(db, key)
    }
}

impl Lookup for Post {
    const ENTITY: &'static str = "Post";
    const KEY_FIELD: &'static str = "slug";
    const KEY_LABEL: &'static str = "slug";

    fn find_live(db: &Database, key: &str) -> Result<Vec<Self>> {
        posts::find_live_by_slug(db, key)
    }
}
