use super::{TermInput, Taxonomy};
use serde::Serialize;

pub const CATEGORY_NAME_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing)]
    pub created_at: String,
    #[serde(skip_serializing)]
    pub updated_at: String,
}

pub type CategoryInput = TermInput<Category>;

impl Taxonomy for Category {
    const TABLE: &'static str = "categories";
    const ENTITY: &'static str = "Category";
    const VERBOSE_NAME: &'static str = "category";
    const NAME_MAX_LENGTH: usize = CATEGORY_NAME_MAX_LENGTH;
    const COLLECTION_PATH: &'static str = "/blogs/categories";

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
