use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tower_sessions::Session;

use crate::AppState;
use crate::auth::get_current_user;
use crate::categories::parse_kind_param;
use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::error::Result;
use crate::models::{
    CreateTransactionPayload, GetTransactionsQuery, NewTransaction, Transaction,
    TransactionsView, UpdateTransactionPayload,
};
use crate::query::{SortColumn, SortOrder, TransactionQuery};
use crate::service::{CategoryChoice, TransactionService, clean_description};
use crate::utils::{non_blank, parse_date, parse_optional_date, validate_amount};

/// Blank or non-numeric page values mean the first page.
fn parse_page_param(value: Option<&str>) -> i64 {
    non_blank(value)
        .and_then(|page| page.parse().ok())
        .unwrap_or(DEFAULT_PAGE as i64)
}

/// Maps the request parameters one-to-one onto a [TransactionQuery]. The page
/// size is not a request parameter.
pub fn build_query(params: &GetTransactionsQuery) -> Result<TransactionQuery> {
    let kind = parse_kind_param(params.kind.as_deref())?;
    let start_date = parse_optional_date(params.start_date.as_deref())?;
    let end_date = parse_optional_date(params.end_date.as_deref())?;

    let mut query = TransactionQuery::new(kind)
        .with_page(parse_page_param(params.page.as_deref()))
        .with_page_size(DEFAULT_PAGE_SIZE)
        .with_date_range(start_date, end_date)
        .sorted_by(
            SortColumn::from_param(params.sort_column.as_deref()),
            SortOrder::from_param(params.sort_order.as_deref()),
        );
    if let Some(category_id) = non_blank(params.category_id.as_deref()) {
        query = query.with_category(category_id);
    }

    Ok(query)
}

pub async fn create_transaction_for_user(
    service: &TransactionService,
    user_id: &str,
    payload: CreateTransactionPayload,
) -> Result<Transaction> {
    // Validate every field before a category can be created as a side effect.
    validate_amount(payload.amount)?;
    let date = parse_date(&payload.date)?;
    let description = clean_description(payload.description)?;
    let choice = CategoryChoice::from_fields(&payload.category)?;

    let category = service.resolve_category(payload.kind, choice).await?;

    service
        .create_transaction(NewTransaction {
            user_id: user_id.to_string(),
            category_id: category.id,
            kind: payload.kind,
            amount: payload.amount,
            date,
            description,
        })
        .await
}

pub async fn update_transaction_for_user(
    service: &TransactionService,
    user_id: &str,
    transaction_id: &str,
    payload: UpdateTransactionPayload,
) -> Result<Transaction> {
    let existing = service.get_transaction(transaction_id, user_id).await?;

    validate_amount(payload.amount)?;
    let date = parse_date(&payload.date)?;
    let description = clean_description(payload.description)?;
    let choice = CategoryChoice::from_fields(&payload.category)?;

    let category = service.resolve_category(existing.kind, choice).await?;

    service
        .update_transaction(Transaction {
            category_id: category.id,
            category_name: category.name,
            amount: payload.amount,
            date,
            description,
            ..existing
        })
        .await
}

pub async fn get_transactions(
    State(app_state): State<AppState>,
    session: Session,
    Query(params): Query<GetTransactionsQuery>,
) -> std::result::Result<(StatusCode, Json<TransactionsView>), (StatusCode, String)> {
    let user = get_current_user(&app_state.db, &session).await?;
    let query = build_query(&params)?;

    let view = app_state.service.query_transactions(&user.id, query).await?;

    Ok((StatusCode::OK, Json(view)))
}

pub async fn get_transaction(
    State(app_state): State<AppState>,
    session: Session,
    Path(transaction_id): Path<String>,
) -> std::result::Result<(StatusCode, Json<Transaction>), (StatusCode, String)> {
    let user = get_current_user(&app_state.db, &session).await?;

    let transaction = app_state
        .service
        .get_transaction(&transaction_id, &user.id)
        .await?;

    Ok((StatusCode::OK, Json(transaction)))
}

pub async fn create_transaction(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateTransactionPayload>,
) -> std::result::Result<(StatusCode, Json<Transaction>), (StatusCode, String)> {
    let user = get_current_user(&app_state.db, &session).await?;

    let transaction = create_transaction_for_user(&app_state.service, &user.id, payload).await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn update_transaction(
    State(app_state): State<AppState>,
    session: Session,
    Path(transaction_id): Path<String>,
    Json(payload): Json<UpdateTransactionPayload>,
) -> std::result::Result<(StatusCode, Json<Transaction>), (StatusCode, String)> {
    let user = get_current_user(&app_state.db, &session).await?;

    let transaction =
        update_transaction_for_user(&app_state.service, &user.id, &transaction_id, payload)
            .await?;

    Ok((StatusCode::OK, Json(transaction)))
}

/// Reports 404 for ids the user cannot see. The soft delete itself never fails
/// on a missing row.
pub async fn delete_transaction(
    State(app_state): State<AppState>,
    session: Session,
    Path(transaction_id): Path<String>,
) -> std::result::Result<StatusCode, (StatusCode, String)> {
    let user = get_current_user(&app_state.db, &session).await?;

    app_state
        .service
        .get_transaction(&transaction_id, &user.id)
        .await?;
    app_state
        .service
        .delete_transaction(&transaction_id, &user.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
