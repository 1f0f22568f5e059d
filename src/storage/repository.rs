use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Amount, Balance, Operation, OperationType, Wallet, WalletId};

use super::{MIGRATION_001_INITIAL, StoreTransaction, WalletStore};

/// Repository for persisting and querying wallets and their operation log.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run against an existing database.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    fn row_to_wallet(row: &sqlx::sqlite::SqliteRow) -> Result<Wallet> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Wallet {
            id: Uuid::parse_str(&id_str).context("Invalid wallet ID")?,
            balance: row.get("balance"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_operation(row: &sqlx::sqlite::SqliteRow) -> Result<Operation> {
        let wallet_id_str: String = row.get("wallet_id");
        let operation_type_str: String = row.get("operation_type");
        let created_at_str: String = row.get("created_at");

        Ok(Operation {
            id: row.get("id"),
            wallet_id: Uuid::parse_str(&wallet_id_str).context("Invalid wallet ID")?,
            operation_type: OperationType::from_str(&operation_type_str).ok_or_else(|| {
                anyhow::anyhow!("Invalid operation type: {}", operation_type_str)
            })?,
            amount: row.get("amount"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .context("Invalid created_at timestamp")?
        .with_timezone(&Utc))
}

impl WalletStore for Repository {
    type Tx = RepositoryTransaction;

    async fn begin(&self) -> Result<RepositoryTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        Ok(RepositoryTransaction { tx })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Failed to ping database")?;
        Ok(())
    }

    async fn create_wallet(&self) -> Result<Wallet> {
        let wallet = Wallet::new();
        sqlx::query("INSERT INTO wallets (id, balance, created_at) VALUES (?, ?, ?)")
            .bind(wallet.id.to_string())
            .bind(wallet.balance)
            .bind(wallet.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to create wallet")?;
        Ok(wallet)
    }

    async fn get_balance(&self, id: WalletId) -> Result<Option<Balance>> {
        let row = sqlx::query("SELECT balance FROM wallets WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch wallet balance")?;

        Ok(row.map(|row| row.get("balance")))
    }

    async fn list_wallets(&self) -> Result<Vec<Wallet>> {
        let rows = sqlx::query("SELECT id, balance, created_at FROM wallets")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list wallets")?;

        rows.iter().map(Self::row_to_wallet).collect()
    }

    async fn delete_wallet(&self, id: WalletId) -> Result<bool> {
        // Operation rows follow via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM wallets WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete wallet")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_operations(&self, wallet_id: WalletId) -> Result<Vec<Operation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, wallet_id, operation_type, amount, created_at
            FROM operations
            WHERE wallet_id = ?
            ORDER BY id
            "#,
        )
        .bind(wallet_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list operations")?;

        rows.iter().map(Self::row_to_operation).collect()
    }
}

/// An open SQLite transaction. Rolled back on drop unless committed.
pub struct RepositoryTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl StoreTransaction for RepositoryTransaction {
    async fn lock_balance(&mut self, id: WalletId) -> Result<Option<Balance>> {
        // A no-op write takes SQLite's write lock up front, so no other
        // transaction can change this balance before we commit.
        let row = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = balance
            WHERE id = ?
            RETURNING balance
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to lock wallet balance")?;

        debug!(wallet_id = %id, found = row.is_some(), "locked wallet row");
        Ok(row.map(|row| row.get("balance")))
    }

    async fn insert_operation(
        &mut self,
        wallet_id: WalletId,
        operation_type: OperationType,
        amount: Amount,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO operations (wallet_id, operation_type, amount, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(wallet_id.to_string())
        .bind(operation_type.as_str())
        .bind(amount)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .context("Failed to add operation")?;
        Ok(())
    }

    async fn update_balance(&mut self, id: WalletId, balance: Balance) -> Result<()> {
        let result = sqlx::query("UPDATE wallets SET balance = ? WHERE id = ?")
            .bind(balance)
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .context("Failed to update wallet balance")?;

        if result.rows_affected() != 1 {
            anyhow::bail!("Failed to update wallet balance: wallet {} vanished", id);
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("Failed to commit transaction")
    }

    async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .context("Failed to roll back transaction")
    }
}
