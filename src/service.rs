//! The transaction service: the filtered, sorted, paginated listing of a
//! user's transactions, and the category and transaction operations the
//! request layer composes around it.
use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::constants::MAX_CATEGORY_NAME_LENGTH;
use crate::error::{Error, Result};
use crate::models::{Category, CategoryFields, NewTransaction, Transaction, TransactionKind, TransactionsView};
use crate::query::TransactionQuery;
use crate::store::TransactionStore;
use crate::utils::{non_blank, validate_amount, validate_description, validate_string_length};

/// How the caller picked the category for a new or edited transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryChoice {
    /// An existing category id.
    Existing(String),
    /// A name typed by the user. Reused if a same-kind category matches it
    /// case-insensitively, created otherwise.
    Named(String),
}

impl CategoryChoice {
    /// An explicit id wins over a new name, which wins over a typed name.
    pub fn from_fields(fields: &CategoryFields) -> Result<Self> {
        if let Some(id) = non_blank(fields.category_id.as_deref()) {
            return Ok(CategoryChoice::Existing(id.to_string()));
        }
        non_blank(fields.new_category_name.as_deref())
            .or_else(|| non_blank(fields.category_name.as_deref()))
            .map(|name| CategoryChoice::Named(name.to_string()))
            .ok_or_else(|| Error::validation("Category is required"))
    }
}

pub fn validate_category_name(name: &str) -> Result<()> {
    validate_string_length(name, "Category name", MAX_CATEGORY_NAME_LENGTH)
}

/// Trims the description and drops it when blank.
pub fn clean_description(description: Option<String>) -> Result<Option<String>> {
    let description = description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    validate_description(description.as_deref())?;
    Ok(description)
}

#[derive(Clone)]
pub struct TransactionService {
    store: Arc<dyn TransactionStore>,
}

impl TransactionService {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    pub async fn query_transactions(
        &self,
        user_id: &str,
        query: TransactionQuery,
    ) -> Result<TransactionsView> {
        query.validate()?;

        let (transactions, total_count) = self.store.query_transactions(user_id, &query).await?;
        let categories = self.store.list_categories(query.kind).await?;

        tracing::debug!(
            "listed {} of {total_count} {} transactions (page {}, sort {:?} {:?})",
            transactions.len(),
            query.kind,
            query.page,
            query.sort_column,
            query.sort_order,
        );

        Ok(TransactionsView {
            transactions,
            selected_type: query.kind,
            total_pages: query.total_pages(total_count),
            selected_category_id: query.category_id,
            start_date: query.start_date,
            end_date: query.end_date,
            page: query.page,
            page_size: query.page_size,
            total_count,
            sort_column: query.sort_column,
            sort_order: query.sort_order,
            categories,
        })
    }

    pub async fn list_categories(&self, kind: TransactionKind) -> Result<Vec<Category>> {
        self.store.list_categories(kind).await
    }

    pub async fn get_category(&self, category_id: &str) -> Result<Category> {
        self.store
            .get_category(category_id)
            .await?
            .ok_or(Error::NotFound("Category"))
    }

    /// Does not look for an existing category with the same name, see
    /// [TransactionService::resolve_category] for that.
    pub async fn create_category(&self, name: &str, kind: TransactionKind) -> Result<Category> {
        validate_category_name(name)?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            kind,
        };
        self.store.insert_category(&category).await?;

        tracing::info!("created {} category '{}'", kind, category.name);
        Ok(category)
    }

    /// Turns the caller's category choice into a category of `kind`, creating
    /// one when a typed name matches nothing.
    pub async fn resolve_category(
        &self,
        kind: TransactionKind,
        choice: CategoryChoice,
    ) -> Result<Category> {
        match choice {
            CategoryChoice::Existing(id) => {
                let category = self.get_category(&id).await?;
                if category.kind != kind {
                    return Err(Error::validation(format!(
                        "Category '{}' is not an {} category",
                        category.name,
                        kind.as_str().to_lowercase()
                    )));
                }
                Ok(category)
            }
            CategoryChoice::Named(name) => {
                validate_category_name(&name)?;
                match self.store.find_category_by_name(name.trim(), kind).await? {
                    Some(category) => Ok(category),
                    None => self.create_category(&name, kind).await,
                }
            }
        }
    }

    pub async fn get_transaction(&self, transaction_id: &str, user_id: &str) -> Result<Transaction> {
        self.store
            .find_transaction(transaction_id, user_id)
            .await?
            .ok_or(Error::NotFound("Transaction"))
    }

    pub async fn create_transaction(&self, new: NewTransaction) -> Result<Transaction> {
        validate_amount(new.amount)?;
        let description = clean_description(new.description)?;

        let category = self.get_category(&new.category_id).await?;
        if category.kind != new.kind {
            return Err(Error::validation("Category type does not match transaction type"));
        }

        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            category_id: category.id,
            category_name: category.name,
            kind: new.kind,
            amount: new.amount,
            date: new.date,
            description,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        };
        self.store.insert_transaction(&transaction).await?;

        tracing::info!(
            "user {} added {} transaction {}",
            transaction.user_id,
            transaction.kind,
            transaction.id
        );
        Ok(transaction)
    }

    /// Persists the category, amount, date and description of a transaction
    /// previously fetched with [TransactionService::get_transaction] and
    /// stamps its update time.
    pub async fn update_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        validate_amount(transaction.amount)?;
        let description = clean_description(transaction.description)?;

        let category = self.get_category(&transaction.category_id).await?;
        if category.kind != transaction.kind {
            return Err(Error::validation("Category type does not match transaction type"));
        }

        let updated_at = OffsetDateTime::now_utc().max(transaction.created_at);
        let updated = Transaction {
            category_id: category.id,
            category_name: category.name,
            description,
            updated_at: Some(updated_at),
            ..transaction
        };

        if !self.store.update_transaction(&updated).await? {
            return Err(Error::NotFound("Transaction"));
        }

        tracing::info!("user {} updated transaction {}", updated.user_id, updated.id);
        Ok(updated)
    }

    /// Missing, foreign and already deleted transactions are left alone.
    pub async fn delete_transaction(&self, transaction_id: &str, user_id: &str) -> Result<()> {
        if self
            .store
            .soft_delete_transaction(transaction_id, user_id)
            .await?
        {
            tracing::info!("user {user_id} deleted transaction {transaction_id}");
        }
        Ok(())
    }
}
