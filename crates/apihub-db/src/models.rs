/// Database row types: these map directly to SQLite rows.
/// Distinct from apihub-types API models to keep the DB layer independent.
use apihub_types::api::{CategoryPatch, SentencePatch};
use apihub_types::models::{CategoryResponse, SentenceResponse, UserResponse};
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub hashed_password: String,
    pub nickname: Option<String>,
    pub active: bool,
    pub is_superuser: bool,
    pub created_at: String,
}

/// The per-user `sentence_user_config` record. Its id is what sentences
/// reference as their creator.
#[derive(Debug, Clone)]
pub struct PermissionRow {
    pub id: String,
    pub user_id: String,
    pub is_superuser: bool,
}

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct SentenceRow {
    pub id: String,
    pub content: String,
    pub from_source: Option<String>,
    pub from_who: Option<String>,
    pub likes: i64,
    pub is_disabled: bool,
    pub category_id: String,
    pub creator_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub category: CategoryRow,
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub hashed_password: &'a str,
    pub nickname: Option<&'a str>,
    pub active: bool,
    pub is_superuser: bool,
}

pub struct NewSentence<'a> {
    pub category_id: &'a str,
    pub creator_id: &'a str,
    pub content: &'a str,
    pub from_source: Option<&'a str>,
    pub from_who: Option<&'a str>,
    pub is_disabled: bool,
}

/// Optional filters for the paginated sentence listing.
#[derive(Debug, Default)]
pub struct SentenceFilter {
    /// Restrict to sentences created by this permission record.
    pub creator_id: Option<String>,
    /// Substring match on content.
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub is_disabled: Option<bool>,
}

impl CategoryRow {
    /// Applies only the fields present in the patch.
    pub fn apply(&mut self, patch: CategoryPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
    }

    pub fn into_response(self) -> CategoryResponse {
        CategoryResponse {
            id: parse_uuid(&self.id, "category"),
            created_at: parse_timestamp(&self.created_at, &self.id),
            updated_at: parse_timestamp(&self.updated_at, &self.id),
            name: self.name,
            description: self.description,
        }
    }
}

impl SentenceRow {
    /// Applies only the fields present in the patch. A changed category id
    /// leaves `self.category` stale until the row is re-read.
    pub fn apply(&mut self, patch: SentencePatch) {
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id.to_string();
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(from_source) = patch.from_source {
            self.from_source = from_source;
        }
        if let Some(from_who) = patch.from_who {
            self.from_who = from_who;
        }
        if let Some(is_disabled) = patch.is_disabled {
            self.is_disabled = is_disabled;
        }
    }

    pub fn into_response(self) -> SentenceResponse {
        SentenceResponse {
            id: parse_uuid(&self.id, "sentence"),
            created_at: parse_timestamp(&self.created_at, &self.id),
            updated_at: parse_timestamp(&self.updated_at, &self.id),
            content: self.content,
            from_source: self.from_source,
            from_who: self.from_who,
            likes: self.likes,
            is_disabled: self.is_disabled,
            category: self.category.into_response(),
        }
    }
}

impl UserRow {
    pub fn into_response(self) -> UserResponse {
        UserResponse {
            id: parse_uuid(&self.id, "user"),
            email: self.email,
            nickname: self.nickname,
            active: self.active,
            is_superuser: self.is_superuser,
        }
    }
}

fn parse_uuid(raw: &str, kind: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", kind, raw, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str, owner: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>().unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on row '{}': {}", raw, owner, e);
            DateTime::default()
        })
}
