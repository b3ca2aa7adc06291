use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use apihub_db::models::{CategoryRow, UserRow};
use apihub_db::queries;
use apihub_types::api::{CategoryPatch, CreateCategoryRequest};
use apihub_types::models::{CategoryDeleted, CategoryResponse};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::permissions::basic_info;
use crate::state::AppState;

/// GET /sentence/category
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let rows = state
        .transaction(|conn| Ok(queries::list_categories(conn)?))
        .await?;
    Ok(Json(rows.into_iter().map(CategoryRow::into_response).collect()))
}

/// POST /sentence/category
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .transaction(move |conn| create(conn, &user, req))
        .await?;

    info!("Category created: {}", row.name);
    Ok((StatusCode::CREATED, Json(row.into_response())))
}

/// PUT /sentence/category/{id}
pub async fn update_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<CategoryPatch>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let row = state
        .transaction(move |conn| update(conn, &user, &id.to_string(), patch))
        .await?;
    Ok(Json(row.into_response()))
}

/// DELETE /sentence/category/{id}: also removes the category's sentences.
pub async fn delete_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryDeleted>, ApiError> {
    let row = state
        .transaction(move |conn| delete(conn, &user, &id.to_string()))
        .await?;

    info!("Category deleted: {}", row.name);
    Ok(Json(CategoryDeleted {
        msg: "Category deleted".to_string(),
        category: row.into_response(),
    }))
}

fn create(conn: &Connection, user: &UserRow, req: CreateCategoryRequest) -> Result<CategoryRow, ApiError> {
    basic_info(conn, user)?.require_elevated()?;

    let name = clean_name(&req.name)?;
    let description = clean_description(req.description);

    if queries::category_name_taken(conn, &name, None)? {
        return Err(ApiError::Conflict(format!("Category '{}' already exists", name)));
    }
    Ok(queries::insert_category(conn, &name, description.as_deref())?)
}

fn update(conn: &Connection, user: &UserRow, id: &str, patch: CategoryPatch) -> Result<CategoryRow, ApiError> {
    basic_info(conn, user)?.require_elevated()?;

    let mut row = queries::category_by_id(conn, id)?.ok_or(ApiError::NotFound("Category not found"))?;

    let patch = CategoryPatch {
        name: patch.name.as_deref().map(clean_name).transpose()?,
        description: patch.description.map(clean_description),
    };
    if let Some(name) = &patch.name {
        if queries::category_name_taken(conn, name, Some(id))? {
            return Err(ApiError::Conflict(format!("Category '{}' already exists", name)));
        }
    }

    row.apply(patch);
    Ok(queries::update_category(conn, &row)?)
}

fn delete(conn: &Connection, user: &UserRow, id: &str) -> Result<CategoryRow, ApiError> {
    basic_info(conn, user)?.require_elevated()?;

    let row = queries::category_by_id(conn, id)?.ok_or(ApiError::NotFound("Category not found"))?;
    queries::delete_category(conn, id)?;
    Ok(row)
}

fn clean_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Category name must not be blank".into()));
    }
    Ok(name.to_string())
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
