use crate::models::{CommentDetail, CommentInput, Post};
use crate::Database;
use anyhow::Result;
use rusqlite::Connection;

const COMMENT_SELECT: &str = "SELECT c.id, c.body, c.created_at, c.updated_at, u.email, p.slug
     FROM comments c
     JOIN users u ON u.id = c.author_id
     JOIN posts p ON p.id = c.post_id";

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentDetail> {
    Ok(CommentDetail {
        id: row.get(0)?,
        body: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
        author: row.get(4)?,
        post: row.get(5)?,
    })
}

fn get_comment(conn: &Connection, id: i64) -> Result<CommentDetail> {
    let comment = conn.query_row(
        &format!("{} WHERE c.id = ?", COMMENT_SELECT),
        [id],
        row_to_comment,
    )?;
    Ok(comment)
}

/// Live comments on a post, oldest first.
pub fn list_for_post(db: &Database, post: &Post) -> Result<Vec<CommentDetail>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "{} WHERE c.post_id = ? AND c.deleted_at IS NULL ORDER BY c.created_at, c.id",
        COMMENT_SELECT
    ))?;
    let comments = stmt
        .query_map([post.id], row_to_comment)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn create(
    db: &Database,
    post: &Post,
    author_id: i64,
    input: &CommentInput,
) -> Result<CommentDetail> {
    let body = input.body.as_deref().unwrap_or_default().trim();
    let conn = db.get()?;
    conn.execute(
        "INSERT INTO comments (post_id, author_id, body) VALUES (?, ?, ?)",
        (post.id, author_id, body),
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, post = %post.slug, "Comment added");

    get_comment(&conn, id)
}
