//! The record store behind the transaction service.
//!
//! Every statement touching `transactions` carries an explicit
//! `is_deleted = 0` predicate; soft-deleted rows must never reach a caller.
use async_trait::async_trait;
use libsql::{Row, Value, params_from_iter};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::Db;
use crate::error::{Error, Result};
use crate::models::{Category, Transaction, TransactionKind};
use crate::query::{SortColumn, TransactionQuery};
use crate::utils::{amount_to_cents, cents_to_amount, format_date, parse_date};

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// One page of matching live transactions and the count of all matches.
    async fn query_transactions(
        &self,
        user_id: &str,
        query: &TransactionQuery,
    ) -> Result<(Vec<Transaction>, u64)>;

    async fn find_transaction(&self, id: &str, user_id: &str) -> Result<Option<Transaction>>;

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<()>;

    /// Returns false when no live row owned by the transaction's user matched.
    async fn update_transaction(&self, transaction: &Transaction) -> Result<bool>;

    /// Returns false when no live row owned by `user_id` matched.
    async fn soft_delete_transaction(&self, id: &str, user_id: &str) -> Result<bool>;

    async fn list_categories(&self, kind: TransactionKind) -> Result<Vec<Category>>;

    async fn get_category(&self, id: &str) -> Result<Option<Category>>;

    /// Case-insensitive name lookup within one kind.
    async fn find_category_by_name(
        &self,
        name: &str,
        kind: TransactionKind,
    ) -> Result<Option<Category>>;

    async fn insert_category(&self, category: &Category) -> Result<()>;
}

const TRANSACTION_COLUMNS: &str = "t.id, t.user_id, t.category_id, c.name, t.kind, \
     t.amount_cents, t.date, t.description, t.created_at, t.updated_at";

const TRANSACTION_SOURCE: &str = "transactions t JOIN categories c ON c.id = t.category_id";

#[derive(Clone)]
pub struct LibsqlStore {
    db: Db,
}

impl LibsqlStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

fn parse_kind(value: &str) -> Result<TransactionKind> {
    value
        .parse()
        .map_err(|e| Error::persistence("invalid transaction kind in store", e))
}

fn format_timestamp(timestamp: OffsetDateTime) -> Result<String> {
    timestamp
        .format(&Rfc3339)
        .map_err(|e| Error::persistence("failed to format timestamp", e))
}

fn parse_timestamp(value: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| Error::persistence("invalid timestamp in store", e))
}

pub fn extract_category_from_row(row: &Row) -> Result<Category> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let kind: String = row.get(2)?;

    Ok(Category {
        id,
        name,
        kind: parse_kind(&kind)?,
    })
}

/// Expects the columns in [TRANSACTION_COLUMNS] order.
pub fn extract_transaction_from_row(row: &Row) -> Result<Transaction> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let category_id: String = row.get(2)?;
    let category_name: String = row.get(3)?;
    let kind: String = row.get(4)?;
    let amount_cents: i64 = row.get(5)?;
    let date: String = row.get(6)?;
    let description: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: Option<String> = row.get(9)?;

    Ok(Transaction {
        id,
        user_id,
        category_id,
        category_name,
        kind: parse_kind(&kind)?,
        amount: cents_to_amount(amount_cents),
        date: parse_date(&date).map_err(|e| Error::persistence("invalid date in store", e))?,
        description,
        created_at: parse_timestamp(&created_at)?,
        updated_at: updated_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

/// Builds the shared `WHERE` clause of the listing and its count.
fn filter_clause(user_id: &str, query: &TransactionQuery) -> Result<(String, Vec<Value>)> {
    let mut clause = String::from("WHERE t.is_deleted = 0 AND t.user_id = ? AND t.kind = ?");
    let mut params = vec![
        Value::Text(user_id.to_string()),
        Value::Text(query.kind.as_str().to_string()),
    ];

    if let Some(category_id) = &query.category_id {
        clause.push_str(" AND t.category_id = ?");
        params.push(Value::Text(category_id.clone()));
    }
    if let Some(start_date) = query.start_date {
        clause.push_str(" AND t.date >= ?");
        params.push(Value::Text(format_date(start_date)?));
    }
    if let Some(end_date) = query.end_date {
        clause.push_str(" AND t.date <= ?");
        params.push(Value::Text(format_date(end_date)?));
    }

    Ok((clause, params))
}

fn order_clause(query: &TransactionQuery) -> String {
    let column = match query.sort_column {
        SortColumn::Date => "t.date",
        SortColumn::Amount => "t.amount_cents",
        SortColumn::Category => "c.name COLLATE NOCASE",
    };
    format!("ORDER BY {column} {}, t.id ASC", query.sort_order.as_sql())
}

#[async_trait]
impl TransactionStore for LibsqlStore {
    async fn query_transactions(
        &self,
        user_id: &str,
        query: &TransactionQuery,
    ) -> Result<(Vec<Transaction>, u64)> {
        let (where_clause, params) = filter_clause(user_id, query)?;
        let conn = self.db.read().await;

        let count_sql = format!("SELECT COUNT(*) FROM {TRANSACTION_SOURCE} {where_clause}");
        let mut count_rows = conn
            .query(&count_sql, params_from_iter(params.clone()))
            .await
            .map_err(|e| Error::persistence("failed to count transactions", e))?;
        let total_count: i64 = match count_rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };

        let page_sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM {TRANSACTION_SOURCE} \
             {where_clause} {} LIMIT ? OFFSET ?",
            order_clause(query)
        );
        let mut page_params = params;
        page_params.push(Value::Integer(query.page_size as i64));
        page_params.push(Value::Integer(query.offset() as i64));

        tracing::debug!("{page_sql}");
        let mut rows = conn
            .query(&page_sql, params_from_iter(page_params))
            .await
            .map_err(|e| Error::persistence("failed to query transactions", e))?;

        let mut transactions = Vec::new();
        while let Some(row) = rows.next().await? {
            transactions.push(extract_transaction_from_row(&row)?);
        }

        Ok((transactions, total_count.max(0) as u64))
    }

    async fn find_transaction(&self, id: &str, user_id: &str) -> Result<Option<Transaction>> {
        let conn = self.db.read().await;
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM {TRANSACTION_SOURCE} \
             WHERE t.id = ? AND t.user_id = ? AND t.is_deleted = 0"
        );
        let mut rows = conn
            .query(&sql, (id, user_id))
            .await
            .map_err(|e| Error::persistence("failed to query transaction", e))?;

        match rows.next().await? {
            Some(row) => Ok(Some(extract_transaction_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<()> {
        let amount_cents = amount_to_cents(transaction.amount)?;
        let date = format_date(transaction.date)?;
        let created_at = format_timestamp(transaction.created_at)?;

        let conn = self.db.write().await;
        conn.execute(
            "INSERT INTO transactions (id, user_id, category_id, kind, amount_cents, date, description, created_at, is_deleted) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0)",
            (
                transaction.id.as_str(),
                transaction.user_id.as_str(),
                transaction.category_id.as_str(),
                transaction.kind.as_str(),
                amount_cents,
                date.as_str(),
                transaction.description.as_deref(),
                created_at.as_str(),
            ),
        )
        .await
        .map_err(|e| Error::persistence("transaction creation failed", e))?;

        Ok(())
    }

    async fn update_transaction(&self, transaction: &Transaction) -> Result<bool> {
        let amount_cents = amount_to_cents(transaction.amount)?;
        let date = format_date(transaction.date)?;
        let updated_at = transaction.updated_at.map(format_timestamp).transpose()?;

        let conn = self.db.write().await;
        let affected_rows = conn
            .execute(
                "UPDATE transactions SET category_id = ?, amount_cents = ?, date = ?, description = ?, updated_at = ? WHERE id = ? AND user_id = ? AND is_deleted = 0",
                (
                    transaction.category_id.as_str(),
                    amount_cents,
                    date.as_str(),
                    transaction.description.as_deref(),
                    updated_at.as_deref(),
                    transaction.id.as_str(),
                    transaction.user_id.as_str(),
                ),
            )
            .await
            .map_err(|e| Error::persistence("failed to update transaction", e))?;

        Ok(affected_rows > 0)
    }

    async fn soft_delete_transaction(&self, id: &str, user_id: &str) -> Result<bool> {
        let conn = self.db.write().await;
        let affected_rows = conn
            .execute(
                "UPDATE transactions SET is_deleted = 1 WHERE id = ? AND user_id = ? AND is_deleted = 0",
                (id, user_id),
            )
            .await
            .map_err(|e| Error::persistence("failed to delete transaction", e))?;

        Ok(affected_rows > 0)
    }

    async fn list_categories(&self, kind: TransactionKind) -> Result<Vec<Category>> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                "SELECT id, name, kind FROM categories WHERE kind = ? ORDER BY name COLLATE NOCASE ASC, id ASC",
                [kind.as_str()],
            )
            .await
            .map_err(|e| Error::persistence("failed to query categories", e))?;

        let mut categories = Vec::new();
        while let Some(row) = rows.next().await? {
            categories.push(extract_category_from_row(&row)?);
        }
        Ok(categories)
    }

    async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query("SELECT id, name, kind FROM categories WHERE id = ?", [id])
            .await
            .map_err(|e| Error::persistence("failed to query category", e))?;

        match rows.next().await? {
            Some(row) => Ok(Some(extract_category_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_category_by_name(
        &self,
        name: &str,
        kind: TransactionKind,
    ) -> Result<Option<Category>> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                "SELECT id, name, kind FROM categories WHERE kind = ? AND LOWER(name) = LOWER(?) ORDER BY id ASC LIMIT 1",
                (kind.as_str(), name),
            )
            .await
            .map_err(|e| Error::persistence("failed to check existing category", e))?;

        match rows.next().await? {
            Some(row) => Ok(Some(extract_category_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert_category(&self, category: &Category) -> Result<()> {
        let conn = self.db.write().await;
        conn.execute(
            "INSERT INTO categories (id, name, kind) VALUES (?, ?, ?)",
            (
                category.id.as_str(),
                category.name.as_str(),
                category.kind.as_str(),
            ),
        )
        .await
        .map_err(|e| Error::persistence("category creation failed", e))?;

        Ok(())
    }
}
