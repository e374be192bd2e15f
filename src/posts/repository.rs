use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{NewPost, Page, PostModel};
use crate::shared::AppError;

/// Trait for post repository operations.
///
/// Listings are newest-first; pages are 1-based.
#[async_trait]
pub trait PostRepository {
    async fn create_post(&self, new_post: NewPost) -> Result<PostModel, AppError>;
    async fn get_post(&self, id: i64) -> Result<Option<PostModel>, AppError>;
    async fn update_post(&self, id: i64, title: &str, body: &str) -> Result<PostModel, AppError>;
    async fn delete_post(&self, id: i64) -> Result<(), AppError>;
    async fn list_recent(&self, page: i64, per_page: i64) -> Result<Page<PostModel>, AppError>;
    async fn list_by_author(
        &self,
        author_id: i64,
        page: i64,
        per_page: i64,
    ) -> Result<Page<PostModel>, AppError>;
}

/// In-memory implementation of PostRepository for development and testing
pub struct InMemoryPostRepository {
    posts: Mutex<HashMap<i64, PostModel>>,
    next_id: AtomicI64,
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            posts: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Returns the current number of posts in the repository
    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    /// Newest first; id breaks ties for posts created within the same tick.
    fn page_of(mut posts: Vec<PostModel>, page: i64, per_page: i64) -> Page<PostModel> {
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        let total = posts.len() as i64;
        let offset = ((page - 1) * per_page) as usize;
        let items = posts
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();
        Page {
            items,
            page,
            per_page,
            total,
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    #[instrument(skip(self, new_post))]
    async fn create_post(&self, new_post: NewPost) -> Result<PostModel, AppError> {
        let mut posts = self.posts.lock().unwrap();

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let post = PostModel {
            id,
            title: new_post.title,
            body: new_post.body,
            created_at: Utc::now(),
            author_id: new_post.author_id,
        };
        posts.insert(id, post.clone());

        debug!(post_id = id, author_id = post.author_id, "Post created in memory");
        Ok(post)
    }

    #[instrument(skip(self))]
    async fn get_post(&self, id: i64) -> Result<Option<PostModel>, AppError> {
        let posts = self.posts.lock().unwrap();
        Ok(posts.get(&id).cloned())
    }

    #[instrument(skip(self, title, body))]
    async fn update_post(&self, id: i64, title: &str, body: &str) -> Result<PostModel, AppError> {
        let mut posts = self.posts.lock().unwrap();

        let Some(post) = posts.get_mut(&id) else {
            return Err(AppError::NotFound("Post".to_string()));
        };
        post.title = title.to_string();
        post.body = body.to_string();

        Ok(post.clone())
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: i64) -> Result<(), AppError> {
        let mut posts = self.posts.lock().unwrap();
        if posts.remove(&id).is_none() {
            return Err(AppError::NotFound("Post".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_recent(&self, page: i64, per_page: i64) -> Result<Page<PostModel>, AppError> {
        let posts = self.posts.lock().unwrap();
        Ok(Self::page_of(
            posts.values().cloned().collect(),
            page,
            per_page,
        ))
    }

    #[instrument(skip(self))]
    async fn list_by_author(
        &self,
        author_id: i64,
        page: i64,
        per_page: i64,
    ) -> Result<Page<PostModel>, AppError> {
        let posts = self.posts.lock().unwrap();
        Ok(Self::page_of(
            posts
                .values()
                .filter(|p| p.author_id == author_id)
                .cloned()
                .collect(),
            page,
            per_page,
        ))
    }
}

/// PostgreSQL implementation of post repository
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn post_from_row(row: &sqlx::postgres::PgRow) -> PostModel {
    PostModel {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        created_at: row.get("created_at"),
        author_id: row.get("author_id"),
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    #[instrument(skip(self, new_post))]
    async fn create_post(&self, new_post: NewPost) -> Result<PostModel, AppError> {
        debug!(author_id = new_post.author_id, "Creating post in database");

        let row = sqlx::query(
            "INSERT INTO posts (title, body, author_id) VALUES ($1, $2, $3) \
             RETURNING id, title, body, created_at, author_id",
        )
        .bind(&new_post.title)
        .bind(&new_post.body)
        .bind(new_post.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create post in database");
            AppError::Database(e.to_string())
        })?;

        Ok(post_from_row(&row))
    }

    #[instrument(skip(self))]
    async fn get_post(&self, id: i64) -> Result<Option<PostModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, body, created_at, author_id FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, post_id = id, "Failed to fetch post from database");
            AppError::Database(e.to_string())
        })?;

        Ok(row.as_ref().map(post_from_row))
    }

    #[instrument(skip(self, title, body))]
    async fn update_post(&self, id: i64, title: &str, body: &str) -> Result<PostModel, AppError> {
        let row = sqlx::query(
            "UPDATE posts SET title = $2, body = $3 WHERE id = $1 \
             RETURNING id, title, body, created_at, author_id",
        )
        .bind(id)
        .bind(title)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, post_id = id, "Failed to update post in database");
            AppError::Database(e.to_string())
        })?;

        row.as_ref()
            .map(post_from_row)
            .ok_or_else(|| AppError::NotFound("Post".to_string()))
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, post_id = id, "Failed to delete post from database");
                AppError::Database(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Post".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_recent(&self, page: i64, per_page: i64) -> Result<Page<PostModel>, AppError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .get("count");

        let rows = sqlx::query(
            "SELECT id, title, body, created_at, author_id FROM posts \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list posts from database");
            AppError::Database(e.to_string())
        })?;

        Ok(Page {
            items: rows.iter().map(post_from_row).collect(),
            page,
            per_page,
            total,
        })
    }

    #[instrument(skip(self))]
    async fn list_by_author(
        &self,
        author_id: i64,
        page: i64,
        per_page: i64,
    ) -> Result<Page<PostModel>, AppError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM posts WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .get("count");

        let rows = sqlx::query(
            "SELECT id, title, body, created_at, author_id FROM posts \
             WHERE author_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(author_id)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, author_id, "Failed to list posts by author from database");
            AppError::Database(e.to_string())
        })?;

        Ok(Page {
            items: rows.iter().map(post_from_row).collect(),
            page,
            per_page,
            total,
        })
    }
}
