use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tower_sessions::Session;

use crate::AppState;
use crate::auth::get_current_user;
use crate::error::Error;
use crate::models::{Category, CreateCategoryPayload, GetCategoriesQuery, TransactionKind};
use crate::utils::non_blank;

/// Reads the `type` request parameter, defaulting to expenses.
pub fn parse_kind_param(value: Option<&str>) -> Result<TransactionKind, Error> {
    match non_blank(value) {
        Some(kind) => kind.parse().map_err(Error::Validation),
        None => Ok(TransactionKind::Expense),
    }
}

pub async fn get_categories(
    State(app_state): State<AppState>,
    session: Session,
    Query(query): Query<GetCategoriesQuery>,
) -> Result<(StatusCode, Json<Vec<Category>>), (StatusCode, String)> {
    get_current_user(&app_state.db, &session).await?;
    let kind = parse_kind_param(query.kind.as_deref())?;

    let categories = app_state.service.list_categories(kind).await?;

    Ok((StatusCode::OK, Json(categories)))
}

pub async fn get_category(
    State(app_state): State<AppState>,
    session: Session,
    Path(category_id): Path<String>,
) -> Result<(StatusCode, Json<Category>), (StatusCode, String)> {
    get_current_user(&app_state.db, &session).await?;

    let category = app_state.service.get_category(&category_id).await?;

    Ok((StatusCode::OK, Json(category)))
}

pub async fn create_category(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), (StatusCode, String)> {
    get_current_user(&app_state.db, &session).await?;

    let category = app_state
        .service
        .create_category(&payload.name, payload.kind)
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}
