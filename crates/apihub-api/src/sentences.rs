use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use apihub_db::models::{NewSentence, SentenceFilter, SentenceRow, UserRow};
use apihub_db::queries;
use apihub_types::api::{
    BatchRequest, CreateSentenceRequest, OneOrMany, PageQuery, SampleQuery, SentencePatch,
};
use apihub_types::models::{
    BatchResult, LikeResponse, Page, SentenceDeleted, SentenceResponse,
};

use crate::error::ApiError;
use crate::middleware::{AuthUser, ClientAddr};
use crate::permissions::basic_info;
use crate::state::AppState;

/// Path value that samples across every category.
const ALL_CATEGORIES: &str = "all";
const MAX_SAMPLE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;
const MAX_BATCH: usize = 500;

// -- Handlers --

/// POST /sentence/: body is one sentence or an array of them. An array is
/// all-or-nothing: any duplicate, inside the batch or already stored,
/// rejects the whole request.
pub async fn create_sentences(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<OneOrMany<CreateSentenceRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let many = body.is_many();
    let items = body.into_vec();

    let mut rows = state
        .transaction(move |conn| create(conn, &user, items))
        .await?;

    info!("Created {} sentence(s)", rows.len());
    let reply = if many {
        OneOrMany::Many(rows.into_iter().map(SentenceRow::into_response).collect())
    } else {
        let row = rows
            .pop()
            .ok_or_else(|| anyhow::anyhow!("single create returned no row"))?;
        OneOrMany::One(row.into_response())
    };
    Ok((StatusCode::CREATED, Json(reply)))
}

/// GET /sentence/{category_id}?limit=: random sample from one category or
/// from all of them.
pub async fn sample(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<SampleQuery>,
) -> Result<Json<Vec<SentenceResponse>>, ApiError> {
    if !(1..=MAX_SAMPLE).contains(&query.limit) {
        return Err(ApiError::Validation(format!("limit must be between 1 and {}", MAX_SAMPLE)));
    }
    let category_id = parse_category(&category)?;
    let limit = query.limit;

    let rows = state
        .transaction(move |conn| {
            if let Some(id) = &category_id {
                if queries::category_by_id(conn, id)?.is_none() {
                    return Err(ApiError::NotFound("Category not found"));
                }
            }
            Ok(queries::random_sentences(conn, category_id.as_deref(), limit)?)
        })
        .await?;

    Ok(Json(rows.into_iter().map(SentenceRow::into_response).collect()))
}

/// PUT /sentence/{id}
pub async fn update_sentence(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<SentencePatch>,
) -> Result<Json<SentenceResponse>, ApiError> {
    let row = state
        .transaction(move |conn| update(conn, &user, &id.to_string(), patch))
        .await?;
    Ok(Json(row.into_response()))
}

/// DELETE /sentence/{id}
pub async fn delete_sentence(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SentenceDeleted>, ApiError> {
    let row = state
        .transaction(move |conn| delete(conn, &user, &id.to_string()))
        .await?;

    info!("Sentence {} deleted", row.id);
    Ok(Json(SentenceDeleted {
        msg: "Sentence deleted".to_string(),
        sentence: row.into_response(),
    }))
}

/// GET /sentence/admin/paginated: administrators see everything, everyone
/// else sees only what they created.
pub async fn paginated(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<SentenceResponse>>, ApiError> {
    if query.page < 1 {
        return Err(ApiError::Validation("page must be at least 1".into()));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&query.page_size) {
        return Err(ApiError::Validation(format!("page_size must be between 1 and {}", MAX_PAGE_SIZE)));
    }
    let (page, page_size) = (query.page, query.page_size);

    let (total, rows) = state
        .transaction(move |conn| {
            let info = basic_info(conn, &user)?;
            let filter = SentenceFilter {
                creator_id: (!info.is_elevated()).then(|| info.config_id.clone()),
                search: query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
                category_id: query.category_id.map(|id| id.to_string()),
                is_disabled: query.is_disabled,
            };

            let total = queries::count_sentences(conn, &filter)?;
            let offset = u64::from(page - 1) * u64::from(page_size);
            let rows = queries::sentence_page(conn, &filter, page_size, offset)?;
            Ok((total, rows))
        })
        .await?;

    let items = rows.into_iter().map(SentenceRow::into_response).collect();
    Ok(Json(Page::new(total, page, page_size, items)))
}

/// POST /sentence/admin/batch/status
pub async fn batch_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResult>, ApiError> {
    let is_disabled = req
        .is_disabled
        .ok_or_else(|| ApiError::Validation("is_disabled is required".into()))?;
    let ids = batch_ids(&req.ids)?;

    let affected = state
        .transaction(move |conn| {
            basic_info(conn, &user)?.require_elevated()?;
            Ok(queries::set_disabled(conn, &ids, is_disabled)?)
        })
        .await?;

    info!("Batch status: {} sentence(s) set is_disabled={}", affected, is_disabled);
    Ok(Json(BatchResult { affected }))
}

/// POST /sentence/admin/batch/delete
pub async fn batch_delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResult>, ApiError> {
    let ids = batch_ids(&req.ids)?;

    let affected = state
        .transaction(move |conn| {
            basic_info(conn, &user)?.require_elevated()?;
            Ok(queries::delete_sentences(conn, &ids)?)
        })
        .await?;

    info!("Batch delete: {} sentence(s) removed", affected);
    Ok(Json(BatchResult { affected }))
}

/// POST /sentence/like/{id}: anonymous; nothing stops the same address
/// from liking repeatedly.
pub async fn like(
    State(state): State<AppState>,
    ClientAddr(addr): ClientAddr,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeResponse>, ApiError> {
    let likes = adjust_likes(&state, id, 1).await?;
    info!("Sentence {} liked by {} (now {})", id, addr, likes);
    Ok(Json(LikeResponse { id, likes }))
}

/// POST /sentence/unlike/{id}: anonymous; the counter stops at zero.
pub async fn unlike(
    State(state): State<AppState>,
    ClientAddr(addr): ClientAddr,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeResponse>, ApiError> {
    let likes = adjust_likes(&state, id, -1).await?;
    info!("Sentence {} unliked by {} (now {})", id, addr, likes);
    Ok(Json(LikeResponse { id, likes }))
}

async fn adjust_likes(state: &AppState, id: Uuid, delta: i64) -> Result<i64, ApiError> {
    state
        .transaction(move |conn| {
            queries::adjust_likes(conn, &id.to_string(), delta)?
                .ok_or(ApiError::NotFound("Sentence not found"))
        })
        .await
}

// -- Service --

fn create(
    conn: &Connection,
    user: &UserRow,
    items: Vec<CreateSentenceRequest>,
) -> Result<Vec<SentenceRow>, ApiError> {
    if items.is_empty() {
        return Err(ApiError::Validation("At least one sentence is required".into()));
    }
    if items.len() > MAX_BATCH {
        return Err(ApiError::Validation(format!("At most {} sentences per request", MAX_BATCH)));
    }

    let info = basic_info(conn, user)?;
    let items = items
        .into_iter()
        .map(clean_new_sentence)
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    for item in &items {
        if !seen.insert(item.content.as_str()) {
            return Err(ApiError::Conflict(format!(
                "Duplicate sentence in request: '{}'",
                item.content
            )));
        }
    }

    let contents: Vec<&str> = items.iter().map(|item| item.content.as_str()).collect();
    if let Some(existing) = queries::existing_contents(conn, &contents)?.first() {
        return Err(ApiError::Conflict(format!("Sentence already exists: '{}'", existing)));
    }

    let mut known_categories = HashSet::new();
    for item in &items {
        let category_id = item.category_id.to_string();
        if known_categories.contains(&category_id) {
            continue;
        }
        if queries::category_by_id(conn, &category_id)?.is_none() {
            return Err(ApiError::NotFound("Category not found"));
        }
        known_categories.insert(category_id);
    }

    // Administrators publish directly; everyone else waits for moderation.
    let is_disabled = !info.is_elevated();

    let mut rows = Vec::with_capacity(items.len());
    for item in &items {
        let category_id = item.category_id.to_string();
        let row = queries::insert_sentence(
            conn,
            &NewSentence {
                category_id: &category_id,
                creator_id: &info.config_id,
                content: &item.content,
                from_source: item.from_source.as_deref(),
                from_who: item.from_who.as_deref(),
                is_disabled,
            },
        )?;
        rows.push(row);
    }
    Ok(rows)
}

fn update(conn: &Connection, user: &UserRow, id: &str, patch: SentencePatch) -> Result<SentenceRow, ApiError> {
    let info = basic_info(conn, user)?;
    let mut row = queries::sentence_by_id(conn, id)?.ok_or(ApiError::NotFound("Sentence not found"))?;

    if !info.can_modify(&row) {
        return Err(ApiError::Forbidden("You may only modify your own sentences"));
    }
    if patch.is_disabled.is_some() && !info.is_elevated() {
        return Err(ApiError::Forbidden("Only administrators can change the disabled state"));
    }

    let patch = SentencePatch {
        content: patch.content.as_deref().map(clean_content).transpose()?,
        from_source: patch.from_source.map(clean_optional),
        from_who: patch.from_who.map(clean_optional),
        ..patch
    };

    if let Some(content) = &patch.content {
        if queries::content_taken(conn, content, Some(id))? {
            return Err(ApiError::Conflict(format!("Sentence already exists: '{}'", content)));
        }
    }
    if let Some(category_id) = patch.category_id {
        if queries::category_by_id(conn, &category_id.to_string())?.is_none() {
            return Err(ApiError::NotFound("Category not found"));
        }
    }

    row.apply(patch);
    Ok(queries::update_sentence(conn, &row)?)
}

fn delete(conn: &Connection, user: &UserRow, id: &str) -> Result<SentenceRow, ApiError> {
    let info = basic_info(conn, user)?;
    let row = queries::sentence_by_id(conn, id)?.ok_or(ApiError::NotFound("Sentence not found"))?;

    if !info.can_modify(&row) {
        return Err(ApiError::Forbidden("You may only delete your own sentences"));
    }
    queries::delete_sentence(conn, id)?;
    Ok(row)
}

// -- Input cleaning --

fn clean_new_sentence(item: CreateSentenceRequest) -> Result<CreateSentenceRequest, ApiError> {
    Ok(CreateSentenceRequest {
        content: clean_content(&item.content)?,
        from_source: clean_optional(item.from_source),
        from_who: clean_optional(item.from_who),
        ..item
    })
}

fn clean_content(content: &str) -> Result<String, ApiError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::Validation("Sentence content must not be blank".into()));
    }
    Ok(content.to_string())
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_category(raw: &str) -> Result<Option<String>, ApiError> {
    if raw == ALL_CATEGORIES {
        return Ok(None);
    }
    let id: Uuid = raw
        .parse()
        .map_err(|_| ApiError::Validation(format!("category must be a UUID or '{}'", ALL_CATEGORIES)))?;
    Ok(Some(id.to_string()))
}

fn batch_ids(ids: &[Uuid]) -> Result<Vec<String>, ApiError> {
    if ids.is_empty() {
        return Err(ApiError::Validation("ids must not be empty".into()));
    }
    if ids.len() > MAX_BATCH {
        return Err(ApiError::Validation(format!("At most {} ids per request", MAX_BATCH)));
    }
    Ok(ids.iter().map(Uuid::to_string).collect())
}
