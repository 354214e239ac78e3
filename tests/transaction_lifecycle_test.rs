mod common;

use expense_tracker_server::{
    Error,
    models::{NewTransaction, TransactionKind},
    service::CategoryChoice,
};
use rust_decimal::Decimal;
use time::macros::date;

#[tokio::test]
async fn create_then_get_round_trips() -> anyhow::Result<()> {
    let state = common::setup_test_state().await?;
    let user_id = common::create_test_user(&state, "alice", "password123").await?;
    let food = state
        .service
        .create_category("Food", TransactionKind::Expense)
        .await?;

    let created = state
        .service
        .create_transaction(NewTransaction {
            user_id: user_id.clone(),
            category_id: food.id.clone(),
            kind: TransactionKind::Expense,
            amount: Decimal::new(1250, 2),
            date: date!(2024 - 03 - 15),
            description: Some("  Lunch  ".to_string()),
        })
        .await?;

    let fetched = state.service.get_transaction(&created.id, &user_id).await?;

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.user_id, user_id);
    assert_eq!(fetched.category_id, food.id);
    assert_eq!(fetched.category_name, "Food");
    assert_eq!(fetched.kind, TransactionKind::Expense);
    assert_eq!(fetched.amount, Decimal::new(1250, 2));
    assert_eq!(fetched.date, date!(2024 - 03 - 15));
    assert_eq!(fetched.description.as_deref(), Some("Lunch"));
    assert_eq!(fetched.created_at, created.created_at);
    assert_eq!(fetched.updated_at, None);

    Ok(())
}

#[tokio::test]
async fn update_stamps_time_not_before_creation() -> anyhow::Result<()> {
    let state = common::setup_test_state().await?;
    let user_id = common::create_test_user(&state, "alice", "password123").await?;
    let food = state
        .service
        .create_category("Food", TransactionKind::Expense)
        .await?;
    let rent = state
        .service
        .create_category("Rent", TransactionKind::Expense)
        .await?;

    let created = state
        .service
        .create_transaction(NewTransaction {
            user_id: user_id.clone(),
            category_id: food.id.clone(),
            kind: TransactionKind::Expense,
            amount: Decimal::from(10),
            date: date!(2024 - 03 - 15),
            description: None,
        })
        .await?;

    let mut edited = state.service.get_transaction(&created.id, &user_id).await?;
    edited.category_id = rent.id.clone();
    edited.amount = Decimal::new(99_99, 2);
    edited.date = date!(2024 - 04 - 01);
    edited.description = Some("April rent".to_string());
    state.service.update_transaction(edited).await?;

    let fetched = state.service.get_transaction(&created.id, &user_id).await?;
    assert_eq!(fetched.category_id, rent.id);
    assert_eq!(fetched.category_name, "Rent");
    assert_eq!(fetched.amount, Decimal::new(9999, 2));
    assert_eq!(fetched.date, date!(2024 - 04 - 01));
    assert_eq!(fetched.description.as_deref(), Some("April rent"));
    let updated_at = fetched.updated_at.expect("update time is stamped");
    assert!(updated_at >= fetched.created_at);

    Ok(())
}

#[tokio::test]
async fn delete_is_a_silent_no_op_for_missing_foreign_and_deleted() -> anyhow::Result<()> {
    let state = common::setup_test_state().await?;
    let alice = common::create_test_user(&state, "alice", "password123").await?;
    let bob = common::create_test_user(&state, "bobby", "password123").await?;
    let food = state
        .service
        .create_category("Food", TransactionKind::Expense)
        .await?;

    let created = state
        .service
        .create_transaction(NewTransaction {
            user_id: alice.clone(),
            category_id: food.id.clone(),
            kind: TransactionKind::Expense,
            amount: Decimal::from(10),
            date: date!(2024 - 03 - 15),
            description: None,
        })
        .await?;

    // Someone else's id leaves the row alone.
    state.service.delete_transaction(&created.id, &bob).await?;
    assert!(state.service.get_transaction(&created.id, &alice).await.is_ok());

    state.service.delete_transaction(&created.id, &alice).await?;
    state.service.delete_transaction(&created.id, &alice).await?;
    state.service.delete_transaction("no-such-id", &alice).await?;

    let result = state.service.get_transaction(&created.id, &alice).await;
    assert!(matches!(result, Err(Error::NotFound("Transaction"))));

    // The row is still stored, only flagged.
    let conn = state.db.read().await;
    let mut rows = conn
        .query(
            "SELECT is_deleted FROM transactions WHERE id = ?",
            [created.id.as_str()],
        )
        .await?;
    let row = rows.next().await?.expect("soft-deleted row remains");
    let is_deleted: bool = row.get(0)?;
    assert!(is_deleted);

    Ok(())
}

#[tokio::test]
async fn update_of_deleted_transaction_reports_not_found() -> anyhow::Result<()> {
    let state = common::setup_test_state().await?;
    let user_id = common::create_test_user(&state, "alice", "password123").await?;
    let food = state
        .service
        .create_category("Food", TransactionKind::Expense)
        .await?;
    let created = state
        .service
        .create_transaction(NewTransaction {
            user_id: user_id.clone(),
            category_id: food.id.clone(),
            kind: TransactionKind::Expense,
            amount: Decimal::from(10),
            date: date!(2024 - 03 - 15),
            description: None,
        })
        .await?;

    let fetched = state.service.get_transaction(&created.id, &user_id).await?;
    state.service.delete_transaction(&created.id, &user_id).await?;

    let result = state.service.update_transaction(fetched).await;
    assert!(matches!(result, Err(Error::NotFound("Transaction"))));

    Ok(())
}

#[tokio::test]
async fn other_users_cannot_read_a_transaction() -> anyhow::Result<()> {
    let state = common::setup_test_state().await?;
    let alice = common::create_test_user(&state, "alice", "password123").await?;
    let bob = common::create_test_user(&state, "bobby", "password123").await?;
    let food = state
        .service
        .create_category("Food", TransactionKind::Expense)
        .await?;
    let created = state
        .service
        .create_transaction(NewTransaction {
            user_id: alice,
            category_id: food.id,
            kind: TransactionKind::Expense,
            amount: Decimal::from(10),
            date: date!(2024 - 03 - 15),
            description: None,
        })
        .await?;

    let result = state.service.get_transaction(&created.id, &bob).await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn invalid_transactions_are_rejected() -> anyhow::Result<()> {
    let state = common::setup_test_state().await?;
    let user_id = common::create_test_user(&state, "alice", "password123").await?;
    let salary = state
        .service
        .create_category("Salary", TransactionKind::Income)
        .await?;
    let food = state
        .service
        .create_category("Food", TransactionKind::Expense)
        .await?;

    let base = NewTransaction {
        user_id,
        category_id: food.id.clone(),
        kind: TransactionKind::Expense,
        amount: Decimal::from(10),
        date: date!(2024 - 03 - 15),
        description: None,
    };

    let zero = NewTransaction {
        amount: Decimal::ZERO,
        ..base.clone()
    };
    assert!(matches!(
        state.service.create_transaction(zero).await,
        Err(Error::Validation(_))
    ));

    let wrong_kind = NewTransaction {
        category_id: salary.id.clone(),
        ..base.clone()
    };
    assert!(matches!(
        state.service.create_transaction(wrong_kind).await,
        Err(Error::Validation(_))
    ));

    let long_description = NewTransaction {
        description: Some("x".repeat(501)),
        ..base.clone()
    };
    assert!(matches!(
        state.service.create_transaction(long_description).await,
        Err(Error::Validation(_))
    ));

    let missing_category = NewTransaction {
        category_id: "missing".to_string(),
        ..base
    };
    assert!(matches!(
        state.service.create_transaction(missing_category).await,
        Err(Error::NotFound("Category"))
    ));

    Ok(())
}

#[tokio::test]
async fn resolve_category_reuses_names_case_insensitively() -> anyhow::Result<()> {
    let state = common::setup_test_state().await?;
    let groceries = state
        .service
        .create_category("Groceries", TransactionKind::Expense)
        .await?;

    let reused = state
        .service
        .resolve_category(
            TransactionKind::Expense,
            CategoryChoice::Named("  GROCERIES ".to_string()),
        )
        .await?;
    assert_eq!(reused.id, groceries.id);

    // Same name, other kind: a new income category.
    let income = state
        .service
        .resolve_category(
            TransactionKind::Income,
            CategoryChoice::Named("groceries".to_string()),
        )
        .await?;
    assert_ne!(income.id, groceries.id);
    assert_eq!(income.kind, TransactionKind::Income);
    assert_eq!(income.name, "groceries");

    let by_id = state
        .service
        .resolve_category(
            TransactionKind::Expense,
            CategoryChoice::Existing(groceries.id.clone()),
        )
        .await?;
    assert_eq!(by_id, groceries);

    let mismatched = state
        .service
        .resolve_category(
            TransactionKind::Income,
            CategoryChoice::Existing(groceries.id.clone()),
        )
        .await;
    assert!(matches!(mismatched, Err(Error::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn create_category_does_not_deduplicate() -> anyhow::Result<()> {
    let state = common::setup_test_state().await?;
    let first = state
        .service
        .create_category("Gifts", TransactionKind::Income)
        .await?;
    let second = state
        .service
        .create_category("gifts", TransactionKind::Income)
        .await?;

    assert_ne!(first.id, second.id);
    assert_eq!(
        state
            .service
            .list_categories(TransactionKind::Income)
            .await?
            .len(),
        2
    );
    assert!(matches!(
        state.service.get_category("unknown").await,
        Err(Error::NotFound("Category"))
    ));
    assert!(matches!(
        state
            .service
            .create_category(&"c".repeat(101), TransactionKind::Income)
            .await,
        Err(Error::Validation(_))
    ));

    Ok(())
}
