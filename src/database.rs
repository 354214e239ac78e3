use anyhow::Result;
use libsql::{Builder, Connection};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

use crate::constants::DATABASE_FILE_NAME;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             TEXT    PRIMARY KEY,
    name           TEXT    UNIQUE NOT NULL,
    password_hash  TEXT    NOT NULL,
    is_deleted     BOOLEAN NOT NULL DEFAULT FALSE
);
"#;

const CREATE_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id    TEXT PRIMARY KEY,
    name  TEXT NOT NULL,
    kind  TEXT NOT NULL CHECK (kind IN ('Income', 'Expense'))
);
"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id           TEXT    PRIMARY KEY,
    user_id      TEXT    NOT NULL,
    category_id  TEXT    NOT NULL,
    kind         TEXT    NOT NULL CHECK (kind IN ('Income', 'Expense')),
    amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
    date         TEXT    NOT NULL,
    description  TEXT,
    created_at   TEXT    NOT NULL,
    updated_at   TEXT,
    is_deleted   BOOLEAN NOT NULL DEFAULT FALSE,
    FOREIGN KEY (user_id) REFERENCES users(id),
    FOREIGN KEY (category_id) REFERENCES categories(id)
);
"#;

const CREATE_TRANSACTIONS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transactions_user_kind_date
    ON transactions(user_id, kind, date);
"#;

const CREATE_CATEGORIES_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_categories_kind_name ON categories(kind, name);
"#;

pub type Db = Arc<RwLock<Connection>>;

async fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_USERS_TABLE, ()).await?;
    conn.execute(CREATE_CATEGORIES_TABLE, ()).await?;
    conn.execute(CREATE_TRANSACTIONS_TABLE, ()).await?;
    conn.execute(CREATE_TRANSACTIONS_INDEX, ()).await?;
    conn.execute(CREATE_CATEGORIES_INDEX, ()).await?;
    Ok(())
}

/// Opens (and creates if needed) the application database under `data_dir`.
pub async fn init_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(DATABASE_FILE_NAME);
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    create_schema(&conn).await?;
    tracing::info!("database ready at {data_dir}/{DATABASE_FILE_NAME}");

    Ok(Arc::new(RwLock::new(conn)))
}

/// A throwaway database, mostly for tests.
pub async fn open_in_memory() -> Result<Db> {
    let db = Builder::new_local(":memory:").build().await?;
    let conn = db.connect()?;

    create_schema(&conn).await?;

    Ok(Arc::new(RwLock::new(conn)))
}
