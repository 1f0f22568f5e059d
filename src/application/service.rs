use tracing::{debug, info, warn};

use crate::domain::{Amount, Balance, Operation, OperationRequest, Wallet, WalletId};
use crate::storage::{Repository, StoreTransaction, WalletStore};

use super::AppError;

/// Application service for wallets and their balances.
/// This is the primary interface for any client (HTTP, CLI, tests).
#[derive(Clone)]
pub struct WalletService<S> {
    store: S,
}

impl WalletService<Repository> {
    /// Initialize a database at the given path, creating it if needed.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }
}

impl<S: WalletStore> WalletService<S> {
    /// Create a new service on top of the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check that the backing store answers.
    pub async fn health_check(&self) -> Result<(), AppError> {
        Ok(self.store.ping().await?)
    }

    // ========================
    // Wallet lifecycle
    // ========================

    /// Create a new, empty wallet.
    pub async fn create_wallet(&self) -> Result<Wallet, AppError> {
        let wallet = self.store.create_wallet().await?;
        info!(wallet_id = %wallet.id, "created wallet");
        Ok(wallet)
    }

    /// Get the current balance of a wallet.
    pub async fn get_balance(&self, id: WalletId) -> Result<Balance, AppError> {
        self.store
            .get_balance(id)
            .await?
            .ok_or(AppError::WalletNotFound(id))
    }

    /// List all wallets, in no particular order.
    pub async fn list_wallets(&self) -> Result<Vec<Wallet>, AppError> {
        Ok(self.store.list_wallets().await?)
    }

    /// Delete a wallet and its operation history.
    pub async fn delete_wallet(&self, id: WalletId) -> Result<(), AppError> {
        if !self.store.delete_wallet(id).await? {
            return Err(AppError::WalletNotFound(id));
        }
        info!(wallet_id = %id, "deleted wallet");
        Ok(())
    }

    /// Operations applied to a wallet, oldest first.
    pub async fn operation_history(&self, id: WalletId) -> Result<Vec<Operation>, AppError> {
        // Distinguish "no history" from "no wallet"
        self.get_balance(id).await?;
        Ok(self.store.list_operations(id).await?)
    }

    // ========================
    // Balance operations
    // ========================

    /// Validate and apply a raw deposit/withdraw request. Returns the new balance.
    ///
    /// Type and amount are checked before any transaction is opened.
    pub async fn apply_operation(
        &self,
        wallet_id: WalletId,
        operation_type: &str,
        amount: Amount,
    ) -> Result<Balance, AppError> {
        let request = OperationRequest::parse(operation_type, amount).inspect_err(|err| {
            warn!(wallet_id = %wallet_id, error = %err, "rejected operation");
        })?;
        self.apply(wallet_id, request).await
    }

    /// Apply a checked operation atomically: lock the wallet, compute the new
    /// balance, append to the operation log and store the balance. Either both
    /// writes are committed or neither is.
    pub async fn apply(
        &self,
        wallet_id: WalletId,
        request: OperationRequest,
    ) -> Result<Balance, AppError> {
        let mut tx = self.store.begin().await?;
        let outcome = Self::write_operation(&mut tx, wallet_id, request).await;

        match outcome {
            Ok(new_balance) => {
                tx.commit().await?;
                info!(
                    wallet_id = %wallet_id,
                    operation = %request.operation_type(),
                    amount = request.amount(),
                    balance = new_balance,
                    "applied operation"
                );
                Ok(new_balance)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(wallet_id = %wallet_id, error = %rollback_err, "rollback failed");
                }
                if let AppError::Rejected(reason) = &err {
                    warn!(wallet_id = %wallet_id, error = %reason, "rejected operation");
                }
                Err(err)
            }
        }
    }

    async fn write_operation(
        tx: &mut S::Tx,
        wallet_id: WalletId,
        request: OperationRequest,
    ) -> Result<Balance, AppError> {
        let balance = tx
            .lock_balance(wallet_id)
            .await?
            .ok_or(AppError::WalletNotFound(wallet_id))?;

        let new_balance = request.apply_to(balance)?;
        debug!(wallet_id = %wallet_id, balance, new_balance, "writing operation");

        tx.insert_operation(wallet_id, request.operation_type(), request.amount())
            .await?;
        tx.update_balance(wallet_id, new_balance).await?;
        Ok(new_balance)
    }
}
