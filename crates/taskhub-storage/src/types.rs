//! Entities persisted by the storage backends.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A registered account.
///
/// The record serializes all of its fields, including the password hash, so
/// that backends and caches can store it. HTTP responses use their own view
/// types and never expose the hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: Uuid,

    /// Email address, unique across accounts. Compared as stored.
    pub email: String,

    /// PHC-encoded password digest.
    pub password_hash: String,

    /// When the account was registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Account {
    /// Builds a new account with a fresh id and the current timestamp.
    #[must_use]
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// A todo item owned by exactly one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,

    /// Owning account. Never changes after creation.
    pub user_id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub completed: bool,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Task {
    /// Builds a new, not yet completed task for `user_id`.
    #[must_use]
    pub fn new(user_id: Uuid, title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: description.into(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if `account_id` owns this task.
    #[must_use]
    pub fn is_owned_by(&self, account_id: Uuid) -> bool {
        self.user_id == account_id
    }

    /// Applies the fields present in `patch` and refreshes `updated_at`.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = OffsetDateTime::now_utc();
    }
}

/// Partial update of a task. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_debug_redacts_hash() {
        let account = Account::new("alice@example.com", "$argon2id$secret");
        let debug = format!("{account:?}");
        assert!(debug.contains("alice@example.com"));
        assert!(!debug.contains("$argon2id$secret"));
    }

    #[test]
    fn test_new_task_defaults() {
        let owner = Uuid::new_v4();
        let task = Task::new(owner, "Buy milk", "");
        assert!(!task.completed);
        assert!(task.is_owned_by(owner));
        assert!(!task.is_owned_by(Uuid::new_v4()));
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn test_apply_patch_only_touches_present_fields() {
        let mut task = Task::new(Uuid::new_v4(), "Buy milk", "2 litres");
        let before = task.updated_at;

        task.apply(TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        });

        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "2 litres");
        assert!(task.completed);
        assert!(task.updated_at >= before);
    }

    #[test]
    fn test_task_json_field_names() {
        let task = Task::new(Uuid::new_v4(), "t", "d");
        let value = serde_json::to_value(&task).unwrap();
        for key in [
            "id",
            "user_id",
            "title",
            "description",
            "completed",
            "created_at",
            "updated_at",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_patch_deserializes_partial_body() {
        let patch: TaskPatch = serde_json::from_str(r#"{"completed":true}"#).unwrap();
        assert_eq!(patch.completed, Some(true));
        assert!(patch.title.is_none());
        assert!(!patch.is_empty());
        assert!(TaskPatch::default().is_empty());
    }
}
