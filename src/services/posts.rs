use crate::models::{Category, Post, PostDetail, PostFilter, PostInput, Tag, Taxonomy};
use crate::services::slug::{slug_or_derive, validate_slug};
use crate::services::taxonomy::{self, get_live};
use crate::services::validation::{FieldErrors, INVALID_SLUG};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

const POST_COLUMNS: &str = "p.id, p.author_id, p.title, p.slug, p.content, p.category_id, \
                            p.status, p.created_at, p.updated_at";

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        title: row.get(2)?,
        slug: row.get(3)?,
        content: row.get(4)?,
        category_id: row.get(5)?,
        status: row.get::<_, String>(6)?.parse().unwrap_or_default(),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn get_live_post(conn: &Connection, id: i64) -> Result<Option<Post>> {
    let post = conn
        .query_row(
            &format!(
                "SELECT {} FROM posts p WHERE p.id = ? AND p.deleted_at IS NULL",
                POST_COLUMNS
            ),
            [id],
            row_to_post,
        )
        .optional()?;
    Ok(post)
}

/// Live posts with this slug, capped at two.
pub fn find_live_by_slug(db: &Database, slug: &str) -> Result<Vec<Post>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM posts p WHERE p.slug = ? AND p.deleted_at IS NULL LIMIT 2",
        POST_COLUMNS
    ))?;
    let posts = stmt
        .query_map([slug], row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn get_by_slug(db: &Database, slug: &str) -> Result<Option<Post>> {
    Ok(find_live_by_slug(db, slug)?.into_iter().next())
}

fn filter_clause(filter: &PostFilter) -> (String, Vec<String>) {
    let mut sql = String::from(" WHERE p.deleted_at IS NULL");
    let mut params: Vec<String> = Vec::new();

    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        sql.push_str(" AND p.status = ?");
        params.push(status.to_string());
    }
    if let Some(category) = filter.category.as_deref().filter(|s| !s.is_empty()) {
        sql.push_str(
            " AND p.category_id IN (SELECT id FROM categories WHERE slug = ? AND deleted_at IS NULL)",
        );
        params.push(category.to_string());
    }
    if let Some(tag) = filter.tag.as_deref().filter(|s| !s.is_empty()) {
        sql.push_str(
            " AND p.id IN (SELECT pt.post_id FROM post_tags pt JOIN tags t ON t.id = pt.tag_id
                           WHERE t.slug = ? AND t.deleted_at IS NULL)",
        );
        params.push(tag.to_string());
    }
    if let Some(pattern) = taxonomy::search_pattern(filter.search.as_deref()) {
        sql.push_str(" AND (p.title LIKE ? ESCAPE '\\' OR p.content LIKE ? ESCAPE '\\')");
        params.push(pattern.clone());
        params.push(pattern);
    }

    (sql, params)
}

pub fn list(
    db: &Database,
    filter: &PostFilter,
    limit: usize,
    offset: usize,
) -> Result<Vec<PostDetail>> {
    let conn = db.get()?;
    let (clause, params) = filter_clause(filter);
    let sql = format!(
        "SELECT {} FROM posts p{} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
        POST_COLUMNS, clause
    );

    let param_refs: Vec<&dyn rusqlite::ToSql> = params
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .chain(std::iter::once(&limit as &dyn rusqlite::ToSql))
        .chain(std::iter::once(&offset as &dyn rusqlite::ToSql))
        .collect();

    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(param_refs.as_slice(), row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;

    posts.into_iter().map(|p| enrich(&conn, p)).collect()
}

pub fn count(db: &Database, filter: &PostFilter) -> Result<i64> {
    let conn = db.get()?;
    let (clause, params) = filter_clause(filter);
    let param_refs: Vec<&dyn rusqlite::ToSql> =
        params.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM posts p{}", clause),
        param_refs.as_slice(),
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn detail(db: &Database, post: Post) -> Result<PostDetail> {
    let conn = db.get()?;
    enrich(&conn, post)
}

/// Resolves the author email, the live category and the live tags.
fn enrich(conn: &Connection, post: Post) -> Result<PostDetail> {
    let author: String = conn.query_row(
        "SELECT email FROM users WHERE id = ?",
        [post.author_id],
        |row| row.get(0),
    )?;

    let category = match post.category_id {
        Some(id) => get_live::<Category>(conn, id)?,
        None => None,
    };

    let mut tag_stmt = conn.prepare(
        "SELECT t.id, t.name, t.slug, t.created_at, t.updated_at
         FROM tags t JOIN post_tags pt ON t.id = pt.tag_id
         WHERE pt.post_id = ? AND t.deleted_at IS NULL
         ORDER BY t.id",
    )?;
    let tags = tag_stmt
        .query_map([post.id], Tag::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PostDetail {
        id: post.id,
        title: post.title,
        slug: post.slug,
        content: post.content,
        status: post.status,
        created_at: post.created_at,
        updated_at: post.updated_at,
        author,
        category,
        tags,
    })
}

fn invalid_pk(pk: i64) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", pk)
}

fn check_relations(conn: &Connection, errors: &mut FieldErrors, input: &PostInput) -> Result<()> {
    if let Some(Some(category_id)) = input.category_id {
        if get_live::<Category>(conn, category_id)?.is_none() {
            errors.add("category_id", invalid_pk(category_id));
        }
    }
    if let Some(tag_ids) = &input.tag_ids {
        for &tag_id in tag_ids {
            if get_live::<Tag>(conn, tag_id)?.is_none() {
                errors.add("tag_ids", invalid_pk(tag_id));
            }
        }
    }
    Ok(())
}

fn check_slug(
    conn: &Connection,
    errors: &mut FieldErrors,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<()> {
    if !validate_slug(slug) {
        errors.add("slug", INVALID_SLUG);
        return Ok(());
    }
    // The unique index covers soft-deleted posts too.
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE slug = ?1 AND (?2 IS NULL OR id != ?2))",
        rusqlite::params![slug, exclude_id],
        |row| row.get(0),
    )?;
    if taken {
        errors.add("slug", "post with this slug already exists.");
    }
    Ok(())
}

fn replace_tags(conn: &Connection, post_id: i64, tag_ids: &[i64]) -> Result<()> {
    conn.execute("DELETE FROM post_tags WHERE post_id = ?", [post_id])?;
    for tag_id in tag_ids {
        conn.execute(
            "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)",
            (post_id, tag_id),
        )?;
    }
    Ok(())
}

pub fn create(db: &Database, author_id: i64, input: &PostInput) -> Result<Post> {
    let title = input.title.as_deref().unwrap_or_default().trim();
    let content = input.content.as_deref().unwrap_or_default();
    let slug = slug_or_derive(input.slug.as_deref(), title);
    let status = input.status().unwrap_or_default();
    let category_id = input.category_id.flatten();

    let mut conn = db.get()?;
    let mut errors = FieldErrors::new();
    check_slug(&conn, &mut errors, &slug, None)?;
    check_relations(&conn, &mut errors, input)?;
    errors.into_result()?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO posts (author_id, title, slug, content, category_id, status)
         VALUES (?, ?, ?, ?, ?, ?)",
        (
            author_id,
            title,
            &slug,
            content,
            category_id,
            status.to_string(),
        ),
    )?;
    let id = tx.last_insert_rowid();
    if let Some(tag_ids) = &input.tag_ids {
        replace_tags(&tx, id, tag_ids)?;
    }
    tx.commit()?;
    tracing::info!(id, slug = %slug, "Created post");

    get_live_post(&conn, id)?.ok_or_else(|| anyhow::anyhow!("Post {} vanished after insert", id))
}

/// Fields absent from the payload keep their current value. The slug only
/// changes when one is sent, and `tag_ids` replaces the whole set.
pub fn update(db: &Database, current: &Post, input: &PostInput) -> Result<Post> {
    let title = input
        .title
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.title);
    let content = input.content.as_deref().unwrap_or(&current.content);
    let slug = match input.slug.as_deref() {
        Some(explicit) => slug_or_derive(Some(explicit), title),
        None => current.slug.clone(),
    };
    let status = input.status().unwrap_or(current.status);
    let category_id = match input.category_id {
        Some(value) => value,
        None => current.category_id,
    };

    let mut conn = db.get()?;
    let mut errors = FieldErrors::new();
    if slug != current.slug {
        check_slug(&conn, &mut errors, &slug, Some(current.id))?;
    }
    check_relations(&conn, &mut errors, input)?;
    errors.into_result()?;

    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE posts SET title = ?, slug = ?, content = ?, category_id = ?, status = ?,
                updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
         WHERE id = ?",
        (
            title,
            &slug,
            content,
            category_id,
            status.to_string(),
            current.id,
        ),
    )?;
    if let Some(tag_ids) = &input.tag_ids {
        replace_tags(&tx, current.id, tag_ids)?;
    }
    tx.commit()?;

    get_live_post(&conn, current.id)?
        .ok_or_else(|| anyhow::anyhow!("Post {} vanished during update", current.id))
}

pub fn soft_delete(db: &Database, id: i64) -> Result<()> {
    let conn = db.get()?;
    conn.execute(
        "UPDATE posts SET deleted_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
         WHERE id = ? AND deleted_at IS NULL",
        [id],
    )?;
    tracing::info!(id, "Soft deleted post");
    Ok(())
}
