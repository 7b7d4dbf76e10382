use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::post::Post;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert a post. `published_date` is usually `None` (a draft); the
    /// new-post form passes the current time to publish immediately.
    pub async fn create_post(
        &self,
        author_id: Uuid,
        title: String,
        text: String,
        published_date: Option<OffsetDateTime>,
    ) -> Result<Post> {
        let row = sqlx::query(
            "WITH inserted_post AS ( \
                INSERT INTO posts (author_id, title, text, published_date) \
                VALUES ($1, $2, $3, $4) \
                RETURNING id, author_id, title, text, created_date, published_date \
             ) \
             SELECT p.*, u.username AS author_name \
             FROM inserted_post p \
             JOIN users u ON p.author_id = u.id",
        )
        .bind(author_id)
        .bind(title)
        .bind(text)
        .bind(published_date)
        .fetch_one(self.db.pool())
        .await?;

        Ok(post_from_row(&row))
    }

    pub async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(
            "SELECT p.id, p.author_id, u.username AS author_name, \
                    p.title, p.text, p.created_date, p.published_date \
             FROM posts p \
             JOIN users u ON p.author_id = u.id \
             WHERE p.id = $1",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    /// Rewrite title and text in place. The author never changes.
    pub async fn update_post(
        &self,
        post_id: i64,
        title: String,
        text: String,
    ) -> Result<Option<Post>> {
        let row = sqlx::query(
            "WITH updated_post AS ( \
                UPDATE posts \
                SET title = $2, text = $3 \
                WHERE id = $1 \
                RETURNING id, author_id, title, text, created_date, published_date \
             ) \
             SELECT p.*, u.username AS author_name \
             FROM updated_post p \
             JOIN users u ON p.author_id = u.id",
        )
        .bind(post_id)
        .bind(title)
        .bind(text)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    /// Stamp `published_date` with the current time. Re-publishing simply
    /// overwrites the stamp.
    pub async fn publish_post(&self, post_id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(
            "WITH published_post AS ( \
                UPDATE posts \
                SET published_date = now() \
                WHERE id = $1 \
                RETURNING id, author_id, title, text, created_date, published_date \
             ) \
             SELECT p.*, u.username AS author_name \
             FROM published_post p \
             JOIN users u ON p.author_id = u.id",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    pub async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Published posts, oldest publication first.
    pub async fn list_published(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT p.id, p.author_id, u.username AS author_name, \
                    p.title, p.text, p.created_date, p.published_date \
             FROM posts p \
             JOIN users u ON p.author_id = u.id \
             WHERE p.published_date <= now() \
             ORDER BY p.published_date ASC, p.id ASC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    /// Unpublished posts, oldest creation first.
    pub async fn list_drafts(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT p.id, p.author_id, u.username AS author_name, \
                    p.title, p.text, p.created_date, p.published_date \
             FROM posts p \
             JOIN users u ON p.author_id = u.id \
             WHERE p.published_date IS NULL \
             ORDER BY p.created_date ASC, p.id ASC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }
}

fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        author_id: row.get("author_id"),
        author_name: row.get("author_name"),
        title: row.get("title"),
        text: row.get("text"),
        created_date: row.get("created_date"),
        published_date: row.get("published_date"),
    }
}
