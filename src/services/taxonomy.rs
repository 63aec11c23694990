use crate::models::{TermInput, Taxonomy};
use crate::services::slug::{slug_or_derive, validate_slug};
use crate::services::validation::{FieldErrors, INVALID_SLUG};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

fn select<T: Taxonomy>() -> String {
    format!(
        "SELECT id, name, slug, created_at, updated_at FROM {}",
        T::TABLE
    )
}

/// A `LIKE ... ESCAPE '\'` pattern matching `search` anywhere in the value.
/// Wildcards in the search text match themselves.
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    let search = search.map(str::trim).filter(|s| !s.is_empty())?;
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

pub fn list<T: Taxonomy>(
    db: &Database,
    search: Option<&str>,
    limit: usize,
    offset: usize,
) -> Result<Vec<T>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "{} WHERE deleted_at IS NULL AND (?1 IS NULL OR name LIKE ?1 ESCAPE '\\')
         ORDER BY id LIMIT {} OFFSET {}",
        select::<T>(),
        limit,
        offset
    ))?;
    let terms = stmt
        .query_map([search_pattern(search)], T::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(terms)
}

pub fn count<T: Taxonomy>(db: &Database, search: Option<&str>) -> Result<i64> {
    let conn = db.get()?;
    let count = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL AND (?1 IS NULL OR name LIKE ?1 ESCAPE '\\')",
            T::TABLE
        ),
        [search_pattern(search)],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub(crate) fn get_live<T: Taxonomy>(conn: &Connection, id: i64) -> Result<Option<T>> {
    let term = conn
        .query_row(
            &format!("{} WHERE id = ? AND deleted_at IS NULL", select::<T>()),
            [id],
            T::from_row,
        )
        .optional()?;
    Ok(term)
}

/// Live rows with this id, capped at two so callers can tell "one" from "many".
pub fn find_live<T: Taxonomy>(db: &Database, id: i64) -> Result<Vec<T>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "{} WHERE id = ? AND deleted_at IS NULL LIMIT 2",
        select::<T>()
    ))?;
    let terms = stmt
        .query_map([id], T::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(terms)
}

fn check_unique<T: Taxonomy>(
    conn: &Connection,
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    exclude_id: Option<i64>,
) -> Result<()> {
    // Unique indexes cover soft-deleted rows too, so check every row.
    let taken: bool = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1 AND (?2 IS NULL OR id != ?2))",
            T::TABLE,
            field
        ),
        rusqlite::params![value, exclude_id],
        |row| row.get(0),
    )?;
    if taken {
        errors.add(
            field,
            format!("{} with this {} already exists.", T::VERBOSE_NAME, field),
        );
    }
    Ok(())
}

pub fn create<T: Taxonomy>(db: &Database, input: &TermInput<T>) -> Result<T> {
    let name = input.name.as_deref().unwrap_or_default().trim();
    let slug = slug_or_derive(input.slug.as_deref(), name);

    let conn = db.get()?;
    let mut errors = FieldErrors::new();
    if !validate_slug(&slug) {
        errors.add("slug", INVALID_SLUG);
    }
    check_unique::<T>(&conn, &mut errors, "name", name, None)?;
    check_unique::<T>(&conn, &mut errors, "slug", &slug, None)?;
    errors.into_result()?;

    conn.execute(
        &format!("INSERT INTO {} (name, slug) VALUES (?, ?)", T::TABLE),
        (name, &slug),
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, slug = %slug, "Created {}", T::VERBOSE_NAME);

    get_live(&conn, id)?.ok_or_else(|| anyhow::anyhow!("{} {} vanished after insert", T::ENTITY, id))
}

/// Applies a PUT or PATCH payload to an existing row. Required fields were
/// already enforced by validation, so absent fields keep their current value
/// and the slug only changes when one is sent.
pub fn update<T: Taxonomy>(db: &Database, current: &T, input: &TermInput<T>) -> Result<T> {
    let name = input
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or(current.name())
        .to_string();
    let slug = match input.slug.as_deref() {
        Some(explicit) => slug_or_derive(Some(explicit), &name),
        None => current.slug().to_string(),
    };

    let conn = db.get()?;
    let mut errors = FieldErrors::new();
    check_unique::<T>(&conn, &mut errors, "name", &name, Some(current.id()))?;
    check_unique::<T>(&conn, &mut errors, "slug", &slug, Some(current.id()))?;
    errors.into_result()?;

    conn.execute(
        &format!(
            "UPDATE {} SET name = ?, slug = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
             WHERE id = ?",
            T::TABLE
        ),
        (&name, &slug, current.id()),
    )?;

    get_live(&conn, current.id())?
        .ok_or_else(|| anyhow::anyhow!("{} {} vanished during update", T::ENTITY, current.id()))
}

pub fn soft_delete<T: Taxonomy>(db: &Database, id: i64) -> Result<()> {
    let conn = db.get()?;
    conn.execute(
        &format!(
            "UPDATE {} SET deleted_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
             WHERE id = ? AND deleted_at IS NULL",
            T::TABLE
        ),
        [id],
    )?;
    tracing::info!(id, "Soft deleted {}", T::VERBOSE_NAME);
    Ok(())
}
