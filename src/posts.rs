use chrono::{DateTime, Duration, SubsecRound, Utc};

use crate::{
    error::AppError,
    models::{NewPost, Post, PostInput},
    policy::{DeleteMode, PostPolicy},
    repository::RepositoryState,
};

/// PostStore
///
/// CRUD over posts on top of the persistence port. Owns the timestamps and
/// applies the deployment's `PostPolicy`; callers never set either.
#[derive(Clone)]
pub struct PostStore {
    repo: RepositoryState,
    policy: PostPolicy,
}

impl PostStore {
    pub fn new(repo: RepositoryState, policy: PostPolicy) -> Self {
        Self { repo, policy }
    }

    /// Live posts, newest first by `created_at`.
    pub async fn list(&self) -> Result<Vec<Post>, AppError> {
        Ok(self.repo.list_posts().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Post, AppError> {
        self.repo.find_post(id).await?.ok_or(AppError::NotFound)
    }

    /// create
    ///
    /// `title`, `content` and `category` are required and must be non-empty.
    pub async fn create(&self, input: PostInput) -> Result<Post, AppError> {
        validate_required(&input)?;

        let now = now();
        let post = NewPost {
            status: self.policy.initial_status(input.status),
            title: input.title,
            content: input.content,
            category: input.category,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.insert_post(post).await?;
        tracing::info!(post_id = created.id, status = created.status.as_str(), "post created");
        Ok(created)
    }

    /// update
    ///
    /// Overwrites `title`, `content` and `category` with exactly what was supplied,
    /// empty strings included. Status follows the active policy.
    pub async fn update(&self, id: i64, input: PostInput) -> Result<Post, AppError> {
        let mut post = self.get(id).await?;

        post.title = input.title;
        post.content = input.content;
        post.category = input.category;
        post.status = self.policy.updated_status(post.status, input.status);
        post.updated_at = advance(post.updated_at);

        // The row may have been deleted between the read and the write.
        let updated = self.repo.update_post(&post).await?.ok_or(AppError::NotFound)?;
        tracing::info!(post_id = updated.id, "post updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mode = self.policy.delete_mode();
        let removed = match mode {
            DeleteMode::Soft => self.repo.soft_delete_post(id, now()).await?,
            DeleteMode::Hard => self.repo.hard_delete_post(id).await?,
        };

        if !removed {
            return Err(AppError::NotFound);
        }
        tracing::info!(post_id = id, mode = ?mode, "post deleted");
        Ok(())
    }
}

fn validate_required(input: &PostInput) -> Result<(), AppError> {
    let missing: Vec<&str> = [
        ("title", &input.title),
        ("content", &input.content),
        ("category", &input.category),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "missing required field(s): {}",
            missing.join(", ")
        )))
    }
}

// Postgres stores microseconds; truncating here keeps stored and returned values equal.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A timestamp strictly later than `previous`, even if the clock has not moved.
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    now().max(previous + Duration::microseconds(1))
}
