use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    models::{Credential, NewPost, Post},
};

/// Repository Trait
///
/// The persistence port. Handlers and services only ever see this contract, which
/// lets the Postgres adapter be swapped for the in-memory one in tests.
///
/// Every operation touches a single record (or a single read query) and relies on
/// the backend for atomicity. "Live" means `deleted_at IS NULL`.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Credentials ---
    async fn find_credential(&self, username: &str) -> Result<Option<Credential>, StoreError>;
    /// Out-of-band seeding only; there is no registration route.
    async fn insert_credential(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Credential, StoreError>;

    // --- Posts ---
    /// Live posts, newest first (`created_at DESC, id DESC`).
    async fn list_posts(&self) -> Result<Vec<Post>, StoreError>;
    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError>;
    /// Include-deleted lookup. Not routed over HTTP.
    async fn find_post_with_deleted(&self, id: i64) -> Result<Option<Post>, StoreError>;
    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError>;
    /// Persists title, content, status, category and updated_at of a live post.
    /// Returns `None` if no live row with `post.id` exists.
    async fn update_post(&self, post: &Post) -> Result<Option<Post>, StoreError>;
    /// Tombstones a live post. Returns false if no live row matched.
    async fn soft_delete_post(&self, id: i64, at: DateTime<Utc>) -> Result<bool, StoreError>;
    /// Erases a live post. Returns false if no live row matched.
    async fn hard_delete_post(&self, id: i64) -> Result<bool, StoreError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Queries are checked at runtime so the crate
/// builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_credential(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        sqlx::query_as::<_, Credential>("SELECT id, username, password FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("find_credential error: {:?}", e);
                e.into()
            })
    }

    async fn insert_credential(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Credential, StoreError> {
        let result = sqlx::query_as::<_, Credential>(
            "INSERT INTO users (username, password) VALUES ($1, $2) RETURNING id, username, password",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(credential) => Ok(credential),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Conflict(format!("username '{username}' already exists")))
            }
            Err(e) => {
                tracing::error!("insert_credential error: {:?}", e);
                Err(e.into())
            }
        }
    }

    /// list_posts
    ///
    /// Tombstoned rows are filtered in SQL; the `id` tiebreak keeps the order stable
    /// for rows sharing a timestamp.
    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, created_at, updated_at, deleted_at, title, content, status, category
            FROM posts
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("list_posts error: {:?}", e);
            e.into()
        })
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, created_at, updated_at, deleted_at, title, content, status, category
            FROM posts
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("find_post error: {:?}", e);
            e.into()
        })
    }

    async fn find_post_with_deleted(&self, id: i64) -> Result<Option<Post>, StoreError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, created_at, updated_at, deleted_at, title, content, status, category
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("find_post_with_deleted error: {:?}", e);
            e.into()
        })
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (created_at, updated_at, title, content, status, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at, updated_at, deleted_at, title, content, status, category
            "#,
        )
        .bind(post.created_at)
        .bind(post.updated_at)
        .bind(post.title)
        .bind(post.content)
        .bind(post.status.as_str())
        .bind(post.category)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("insert_post error: {:?}", e);
            e.into()
        })
    }

    async fn update_post(&self, post: &Post) -> Result<Option<Post>, StoreError> {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $2,
                content = $3,
                status = $4,
                category = $5,
                updated_at = $6
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, created_at, updated_at, deleted_at, title, content, status, category
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.status.as_str())
        .bind(&post.category)
        .bind(post.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("update_post error: {:?}", e);
            e.into()
        })
    }

    async fn soft_delete_post(&self, id: i64, at: DateTime<Utc>) -> Result<bool, StoreError> {
        match sqlx::query("UPDATE posts SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
        {
            Ok(res) => Ok(res.rows_affected() > 0),
            Err(e) => {
                tracing::error!("soft_delete_post error: {:?}", e);
                Err(e.into())
            }
        }
    }

    async fn hard_delete_post(&self, id: i64) -> Result<bool, StoreError> {
        match sqlx::query("DELETE FROM posts WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => Ok(res.rows_affected() > 0),
            Err(e) => {
                tracing::error!("hard_delete_post error: {:?}", e);
                Err(e.into())
            }
        }
    }
}

// --- In-Memory Implementation (For Tests) ---

#[derive(Default)]
struct Tables {
    credentials: Vec<Credential>,
    posts: BTreeMap<i64, Post>,
    next_credential_id: i64,
    next_post_id: i64,
}

/// InMemoryRepository
///
/// A `Repository` held entirely in process memory. Used by the test suites to
/// exercise handlers and services without a database. Setting `failing` makes
/// every call return `StoreError::Unavailable`.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
    failing: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        let repo = Self::default();
        repo.set_failing(true);
        repo
    }

    /// Toggles failure injection after seeding.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store: simulated failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_credential(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .credentials
            .iter()
            .find(|c| c.username == username)
            .cloned())
    }

    async fn insert_credential(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Credential, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if tables.credentials.iter().any(|c| c.username == username) {
            return Err(StoreError::Conflict(format!(
                "username '{username}' already exists"
            )));
        }
        tables.next_credential_id += 1;
        let credential = Credential {
            id: tables.next_credential_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.credentials.push(credential.clone());
        Ok(credential)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| p.deleted_at.is_none())
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .get(&id)
            .filter(|p| p.deleted_at.is_none())
            .cloned())
    }

    async fn find_post_with_deleted(&self, id: i64) -> Result<Option<Post>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).cloned())
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        tables.next_post_id += 1;
        let stored = Post {
            id: tables.next_post_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
            deleted_at: None,
            title: post.title,
            content: post.content,
            status: post.status,
            category: post.category,
        };
        tables.posts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_post(&self, post: &Post) -> Result<Option<Post>, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        match tables.posts.get_mut(&post.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                existing.title = post.title.clone();
                existing.content = post.content.clone();
                existing.status = post.status;
                existing.category = post.category.clone();
                existing.updated_at = post.updated_at;
                Ok(Some(existing.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn soft_delete_post(&self, id: i64, at: DateTime<Utc>) -> Result<bool, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        match tables.posts.get_mut(&id) {
            Some(existing) if existing.deleted_at.is_none() => {
                existing.deleted_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn hard_delete_post(&self, id: i64) -> Result<bool, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let live = tables
            .posts
            .get(&id)
            .is_some_and(|p| p.deleted_at.is_none());
        if live {
            tables.posts.remove(&id);
        }
        Ok(live)
    }
}
