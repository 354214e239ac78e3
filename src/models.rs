use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::query::{SortColumn, SortOrder};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("Unknown transaction type '{other}'")),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

#[derive(Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub kind: TransactionKind,
}

#[derive(Deserialize)]
pub struct CreateCategoryPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

#[derive(Deserialize, Default)]
pub struct GetCategoriesQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A stored, live transaction with its category name resolved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub category_name: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: Date,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub updated_at: Option<OffsetDateTime>,
}

/// A transaction whose owner and category have already been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: String,
    pub category_id: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: Date,
    pub description: Option<String>,
}

/// Form fields shared by create and edit. At most one category field is used:
/// an explicit id wins over a new name, which wins over a typed name.
#[derive(Deserialize, Debug, Default)]
pub struct CategoryFields {
    pub category_id: Option<String>,
    pub new_category_name: Option<String>,
    pub category_name: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateTransactionPayload {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(flatten)]
    pub category: CategoryFields,
    pub amount: Decimal,
    pub date: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTransactionPayload {
    #[serde(flatten)]
    pub category: CategoryFields,
    pub amount: Decimal,
    pub date: String,
    pub description: Option<String>,
}

/// Query string of `GET /transactions`.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionsQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub sort_column: Option<String>,
    pub sort_order: Option<String>,
}

/// One page of a user's transactions plus everything needed to render the
/// filter and pagination controls.
#[derive(Serialize, Debug, Clone)]
pub struct TransactionsView {
    pub transactions: Vec<Transaction>,
    pub selected_type: TransactionKind,
    pub selected_category_id: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub sort_column: SortColumn,
    pub sort_order: SortOrder,
    pub categories: Vec<Category>,
}
