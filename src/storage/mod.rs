mod repository;

use std::future::Future;

use anyhow::Result;

use crate::domain::{Amount, Balance, Operation, OperationType, Wallet, WalletId};

pub use repository::*;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Storage capability used by the application layer.
///
/// Implementations are cheap to clone handles onto a shared connection pool.
/// Lookups that find nothing return `None` (or `false`) rather than an error.
pub trait WalletStore: Clone + Send + Sync + 'static {
    type Tx: StoreTransaction;

    /// Open a transaction. Dropping it without [`StoreTransaction::commit`] rolls it back.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx>> + Send;

    /// Check that the store is reachable.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;

    /// Insert a new wallet with a zero balance.
    fn create_wallet(&self) -> impl Future<Output = Result<Wallet>> + Send;

    fn get_balance(&self, id: WalletId) -> impl Future<Output = Result<Option<Balance>>> + Send;

    fn list_wallets(&self) -> impl Future<Output = Result<Vec<Wallet>>> + Send;

    /// Delete a wallet together with its operation log. Returns `false` if it did not exist.
    fn delete_wallet(&self, id: WalletId) -> impl Future<Output = Result<bool>> + Send;

    /// The wallet's operation log, oldest first.
    fn list_operations(
        &self,
        wallet_id: WalletId,
    ) -> impl Future<Output = Result<Vec<Operation>>> + Send;
}

/// Read/write operations scoped to one open transaction.
pub trait StoreTransaction: Send + Sized {
    /// Read the balance and hold the wallet's write lock until commit or rollback.
    fn lock_balance(
        &mut self,
        id: WalletId,
    ) -> impl Future<Output = Result<Option<Balance>>> + Send;

    fn insert_operation(
        &mut self,
        wallet_id: WalletId,
        operation_type: OperationType,
        amount: Amount,
    ) -> impl Future<Output = Result<()>> + Send;

    fn update_balance(
        &mut self,
        id: WalletId,
        balance: Balance,
    ) -> impl Future<Output = Result<()>> + Send;

    fn commit(self) -> impl Future<Output = Result<()>> + Send;

    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
