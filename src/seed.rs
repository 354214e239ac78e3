//! Demo data for a fresh database. Invoked separately from the server through
//! the `seed` binary.
use rand::{Rng, SeedableRng, rngs::StdRng};
use rust_decimal::Decimal;
use time::{Date, Duration};

use crate::error::Result;
use crate::models::{NewTransaction, TransactionKind};
use crate::service::TransactionService;

/// Category name and the half-open range its amounts are drawn from.
type CategorySpec = (&'static str, i64, i64);

const INCOME_CATEGORIES: [CategorySpec; 10] = [
    ("Salary", 1000, 3000),
    ("Gift", 50, 300),
    ("Bonus", 100, 1000),
    ("Freelance", 100, 1500),
    ("Interest", 10, 100),
    ("Dividends", 20, 200),
    ("Selling Items", 5, 500),
    ("Refunds", 5, 200),
    ("Investments", 50, 1000),
    ("Other Income", 10, 500),
];

const EXPENSE_CATEGORIES: [CategorySpec; 10] = [
    ("Food", 5, 50),
    ("Transport", 10, 100),
    ("Rent", 200, 600),
    ("Utilities", 50, 150),
    ("Entertainment", 10, 100),
    ("Healthcare", 20, 200),
    ("Education", 50, 500),
    ("Shopping", 20, 200),
    ("Travel", 50, 1000),
    ("Other Expense", 5, 200),
];

const MAX_AGE_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub categories: usize,
    pub transactions: usize,
}

/// Amount and age in days of one demo transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DemoEntry {
    amount: i64,
    days_ago: i64,
}

/// Two or three entries with amounts in `low..high`.
fn demo_entries(rng: &mut StdRng, low: i64, high: i64) -> Vec<DemoEntry> {
    let count = rng.gen_range(2..=3);
    (0..count)
        .map(|_| DemoEntry {
            amount: rng.gen_range(low..high),
            days_ago: rng.gen_range(0..MAX_AGE_DAYS),
        })
        .collect()
}

/// Creates the default categories and a few transactions per category for
/// `user_id`. Returns `None` without touching anything when categories
/// already exist.
pub async fn seed_demo_data(
    service: &TransactionService,
    user_id: &str,
    today: Date,
    seed: u64,
) -> Result<Option<SeedSummary>> {
    let has_income = !service.list_categories(TransactionKind::Income).await?.is_empty();
    let has_expense = !service.list_categories(TransactionKind::Expense).await?.is_empty();
    if has_income || has_expense {
        tracing::info!("categories already exist, skipping seed");
        return Ok(None);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut summary = SeedSummary::default();

    for (kind, specs) in [
        (TransactionKind::Expense, &EXPENSE_CATEGORIES),
        (TransactionKind::Income, &INCOME_CATEGORIES),
    ] {
        for &(name, low, high) in specs.iter() {
            let category = service.create_category(name, kind).await?;
            summary.categories += 1;

            for entry in demo_entries(&mut rng, low, high) {
                let description = match kind {
                    TransactionKind::Expense => format!("Spent on {name}"),
                    TransactionKind::Income => format!("Received from {name}"),
                };
                service
                    .create_transaction(NewTransaction {
                        user_id: user_id.to_string(),
                        category_id: category.id.clone(),
                        kind,
                        amount: Decimal::from(entry.amount),
                        date: today - Duration::days(entry.days_ago),
                        description: Some(description),
                    })
                    .await?;
                summary.transactions += 1;
            }
        }
    }

    tracing::info!(
        "seeded {} categories and {} transactions for user {user_id}",
        summary.categories,
        summary.transactions
    );
    Ok(Some(summary))
}
