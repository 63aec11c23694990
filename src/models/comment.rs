use crate::services::validation::{check_text, FieldErrors, Validate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct CommentDetail {
    pub id: i64,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
    /// Author email.
    pub author: String,
    /// Post slug.
    pub post: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentInput {
    pub body: Option<String>,
}

impl Validate for CommentInput {
    fn validate(&self, partial: bool) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "body", self.body.as_deref(), !partial, None);
        errors.into_result()
    }
}
