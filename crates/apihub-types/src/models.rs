use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub nickname: Option<String>,
    pub active: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceResponse {
    pub id: Uuid,
    pub content: String,
    pub from_source: Option<String>,
    pub from_who: Option<String>,
    pub likes: i64,
    pub is_disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: CategoryResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryDeleted {
    pub msg: String,
    pub category: CategoryResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SentenceDeleted {
    pub msg: String,
    pub sentence: SentenceResponse,
}

/// One page of results plus the metadata needed to walk the rest.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(total: u64, page: u32, page_size: u32, items: Vec<T>) -> Self {
        Self {
            total,
            page,
            page_size,
            total_pages: total.div_ceil(u64::from(page_size.max(1))),
            items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResult {
    pub affected: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub id: Uuid,
    pub likes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Uptime {
    pub total_seconds: f64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub formatted: String,
}

impl Uptime {
    pub fn from_duration(elapsed: std::time::Duration) -> Self {
        let secs = elapsed.as_secs();
        let days = secs / 86_400;
        let hours = (secs % 86_400) / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;
        Self {
            total_seconds: elapsed.as_secs_f64(),
            days,
            hours,
            minutes,
            seconds,
            formatted: format!("{}d {}h {}m {}s", days, hours, minutes, seconds),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime: Uptime,
    pub timestamp: DateTime<Utc>,
}
