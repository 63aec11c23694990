use crate::services::slug::validate_slug;
use crate::services::validation::{check_text, FieldErrors, Validate, INVALID_SLUG};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// A flat name/slug vocabulary stored in its own table.
pub trait Taxonomy: Serialize + Sized + Send + Sync + 'static {
    const TABLE: &'static str;
    /// Name used in lookup messages, e.g. `Category with ID 3 ...`.
    const ENTITY: &'static str;
    /// Lowercase name used in uniqueness messages.
    const VERBOSE_NAME: &'static str;
    const NAME_MAX_LENGTH: usize;
    const COLLECTION_PATH: &'static str;

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;
    fn id(&self) -> i64;
    fn name(&self) -> &str;
    fn slug(&self) -> &str;
}

/// Write payload shared by categories and tags.
#[derive(Debug, Deserialize)]
#[serde(bound = "")]
pub struct TermInput<T> {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(skip)]
    kind: PhantomData<fn() -> T>,
}

impl<T> TermInput<T> {
    pub fn new(name: &str, slug: Option<&str>) -> Self {
        Self {
            name: Some(name.to_string()),
            slug: slug.map(String::from),
            kind: PhantomData,
        }
    }
}

impl<T: Taxonomy> Validate for TermInput<T> {
    fn validate(&self, partial: bool) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_text(
            &mut errors,
            "name",
            self.name.as_deref(),
            !partial,
            Some(T::NAME_MAX_LENGTH),
        );
        if let Some(slug) = self.slug.as_deref() {
            if !validate_slug(slug.trim()) {
                errors.add("slug", INVALID_SLUG);
            }
        }
        errors.into_result()
    }
}
