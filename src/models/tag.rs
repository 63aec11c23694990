use super::{TermInput, Taxonomy};
use serde::Serialize;

pub const TAG_NAME_MAX_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing)]
    pub created_at: String,
    #[serde(skip_serializing)]
    pub updated_at: String,
}

pub type TagInput = TermInput<Tag>;

impl Taxonomy for Tag {
    const TABLE: &'static str = "tags";
    const ENTITY: &'static str = "Tag";
    const VERBOSE_NAME: &'static str = "tag";
    const NAME_MAX_LENGTH: usize = TAG_NAME_MAX_LENGTH;
    const COLLECTION_PATH: &'static str = "/blogs/tags";

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn slug(&self) -> &str {
        &self.slug
    }
}
