use std::{fmt, str::FromStr};

use crate::models::PostStatus;

/// PostPolicy
///
/// The write semantics of a deployment. Exactly one policy is active per
/// running instance; it is read from configuration at startup and never
/// varies per request.
///
/// - `Publishing`: every created post is forced to `published`, updates leave
///   the status untouched, and deletion permanently removes the row.
/// - `Drafting`: the caller may choose a status (defaulting to `draft`), may
///   change it on update, and deletion only tombstones the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostPolicy {
    #[default]
    Publishing,
    Drafting,
}

/// DeleteMode
///
/// How a delete request is carried out by the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Set `deleted_at`; the row stays in storage but leaves every default read.
    Soft,
    /// Erase the row. Irreversible.
    Hard,
}

impl PostPolicy {
    /// Status assigned to a newly created post.
    pub fn initial_status(self, requested: Option<PostStatus>) -> PostStatus {
        match self {
            PostPolicy::Publishing => PostStatus::Published,
            PostPolicy::Drafting => requested.unwrap_or(PostStatus::Draft),
        }
    }

    /// Status a post carries after an update.
    pub fn updated_status(self, current: PostStatus, requested: Option<PostStatus>) -> PostStatus {
        match self {
            PostPolicy::Publishing => current,
            PostPolicy::Drafting => requested.unwrap_or(current),
        }
    }

    pub fn delete_mode(self) -> DeleteMode {
        match self {
            PostPolicy::Publishing => DeleteMode::Hard,
            PostPolicy::Drafting => DeleteMode::Soft,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PostPolicy::Publishing => "publishing",
            PostPolicy::Drafting => "drafting",
        }
    }
}

impl fmt::Display for PostPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "publishing" => Ok(PostPolicy::Publishing),
            "drafting" => Ok(PostPolicy::Drafting),
            other => Err(format!(
                "unknown post policy '{other}', expected 'publishing' or 'drafting'"
            )),
        }
    }
}
