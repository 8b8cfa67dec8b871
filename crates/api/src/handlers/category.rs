//! Handlers for the `/categories` resource.
//!
//! Default categories are read-only and shared by everyone.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use evently_core::error::CoreError;
use evently_core::types::DbId;
use evently_db::models::category::{Category, CreateCategory, UpdateCategory};
use evently_db::repositories::CategoryRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Category",
        id,
    })
}

/// GET /api/v1/categories
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Category>>> {
    let categories = CategoryRepo::list_for_owner(&state.pool, auth.user_id).await?;
    Ok(Json(categories))
}

/// GET /api/v1/categories/default
pub async fn list_defaults(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Category>>> {
    let categories = CategoryRepo::list_defaults(&state.pool).await?;
    Ok(Json(categories))
}

/// POST /api/v1/categories
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<Category>)> {
    input.validate()?;
    let (Some(name), Some(icon), Some(color)) = (&input.name, &input.icon, &input.color) else {
        return Err(CoreError::missing_fields(&input.missing_fields()).into());
    };

    let category = CategoryRepo::create(&state.pool, auth.user_id, name, icon, color).await?;
    tracing::info!(category_id = category.id, user_id = auth.user_id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/v1/categories/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<Json<Category>> {
    input.validate()?;
    let category = CategoryRepo::update(&state.pool, id, auth.user_id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(category))
}

/// DELETE /api/v1/categories/{id}
///
/// Events filed under the category keep existing without one.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !CategoryRepo::delete(&state.pool, id, auth.user_id).await? {
        return Err(not_found(id));
    }
    tracing::info!(category_id = id, user_id = auth.user_id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
