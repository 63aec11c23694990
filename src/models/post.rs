use super::{Category, Tag};
use crate::services::slug::validate_slug;
use crate::services::validation::{check_text, FieldErrors, Validate, INVALID_SLUG};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

pub const POST_TITLE_MAX_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl FromStr for PostStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Published => write!(f, "published"),
        }
    }
}

/// A live `posts` row.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub category_id: Option<i64>,
    pub status: PostStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// The API shape of a post, with its relations resolved.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub status: PostStatus,
    pub created_at: String,
    pub updated_at: String,
    pub author: String,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    /// `Some(None)` clears the category, `None` leaves it untouched.
    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<i64>>,
    pub tag_ids: Option<Vec<i64>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl PostInput {
    pub fn status(&self) -> Option<PostStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}

impl Validate for PostInput {
    fn validate(&self, partial: bool) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_text(
            &mut errors,
            "title",
            self.title.as_deref(),
            !partial,
            Some(POST_TITLE_MAX_LENGTH),
        );
        check_text(&mut errors, "content", self.content.as_deref(), !partial, None);

        if let Some(slug) = self.slug.as_deref() {
            if !validate_slug(slug.trim()) {
                errors.add("slug", INVALID_SLUG);
            }
        }
        if let Some(status) = self.status.as_deref() {
            if status.parse::<PostStatus>().is_err() {
                errors.add("status", format!("\"{}\" is not a valid choice.", status));
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PostFilter {
    pub status: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Tag slug.
    pub tag: Option<String>,
    pub search: Option<String>,
}

impl Validate for PostFilter {
    fn validate(&self, _partial: bool) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            if status.parse::<PostStatus>().is_err() {
                errors.add(
                    "status",
                    format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        status
                    ),
                );
            }
        }
        errors.into_result()
    }
}
