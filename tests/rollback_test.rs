mod common;

use anyhow::{Result, anyhow};
use common::test_repository;
use wallet_ledger::application::{AppError, ErrorClass, WalletService};
use wallet_ledger::domain::{Amount, Balance, Operation, OperationType, Wallet, WalletId};
use wallet_ledger::storage::{Repository, RepositoryTransaction, StoreTransaction, WalletStore};

/// Which write of the transaction should fail.
#[derive(Clone, Copy, PartialEq)]
enum FailAt {
    Nothing,
    UpdateBalance,
    Commit,
}

/// Real SQLite store whose transactions can be told to fail at one step.
#[derive(Clone)]
struct FaultyStore {
    inner: Repository,
    fail_at: FailAt,
}

struct FaultyTransaction {
    inner: RepositoryTransaction,
    fail_at: FailAt,
}

impl WalletStore for FaultyStore {
    type Tx = FaultyTransaction;

    async fn begin(&self) -> Result<FaultyTransaction> {
        Ok(FaultyTransaction {
            inner: self.inner.begin().await?,
            fail_at: self.fail_at,
        })
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }

    async fn create_wallet(&self) -> Result<Wallet> {
        self.inner.create_wallet().await
    }

    async fn get_balance(&self, id: WalletId) -> Result<Option<Balance>> {
        self.inner.get_balance(id).await
    }

    async fn list_wallets(&self) -> Result<Vec<Wallet>> {
        self.inner.list_wallets().await
    }

    async fn delete_wallet(&self, id: WalletId) -> Result<bool> {
        self.inner.delete_wallet(id).await
    }

    async fn list_operations(&self, wallet_id: WalletId) -> Result<Vec<Operation>> {
        self.inner.list_operations(wallet_id).await
    }
}

impl StoreTransaction for FaultyTransaction {
    async fn lock_balance(&mut self, id: WalletId) -> Result<Option<Balance>> {
        self.inner.lock_balance(id).await
    }

    async fn insert_operation(
        &mut self,
        wallet_id: WalletId,
        operation_type: OperationType,
        amount: Amount,
    ) -> Result<()> {
        self.inner
            .insert_operation(wallet_id, operation_type, amount)
            .await
    }

    async fn update_balance(&mut self, id: WalletId, balance: Balance) -> Result<()> {
        if self.fail_at == FailAt::UpdateBalance {
            return Err(anyhow!("simulated write failure"));
        }
        self.inner.update_balance(id, balance).await
    }

    async fn commit(self) -> Result<()> {
        if self.fail_at == FailAt::Commit {
            // Dropping the inner transaction rolls it back
            return Err(anyhow!("simulated commit failure"));
        }
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<()> {
        self.inner.rollback().await
    }
}

async fn service_failing_at(
    fail_at: FailAt,
) -> Result<(WalletService<FaultyStore>, WalletId, tempfile::TempDir)> {
    let (repo, temp) = test_repository().await?;

    // Seed a wallet with balance 100 through a healthy service
    let healthy = WalletService::new(repo.clone());
    let id = healthy.create_wallet().await?.id;
    healthy.apply_operation(id, "deposit", 100).await?;

    let service = WalletService::new(FaultyStore {
        inner: repo,
        fail_at,
    });
    Ok((service, id, temp))
}

#[tokio::test]
async fn test_failed_balance_update_rolls_back_log_insert() -> Result<()> {
    let (service, id, _temp) = service_failing_at(FailAt::UpdateBalance).await?;

    let err = service.apply_operation(id, "deposit", 50).await.unwrap_err();
    assert!(matches!(err, AppError::TransactionFailure(_)));
    assert_eq!(err.class(), ErrorClass::Internal);
    assert_eq!(err.public_message(), "Internal server error");

    // Neither the log row nor the balance change survived
    assert_eq!(service.get_balance(id).await?, 100);
    let history = service.operation_history(id).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].amount, 100);

    Ok(())
}

#[tokio::test]
async fn test_failed_commit_leaves_no_trace() -> Result<()> {
    let (service, id, _temp) = service_failing_at(FailAt::Commit).await?;

    let err = service.apply_operation(id, "withdraw", 30).await.unwrap_err();
    assert!(matches!(err, AppError::TransactionFailure(_)));

    assert_eq!(service.get_balance(id).await?, 100);
    assert_eq!(service.operation_history(id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_wallet_usable_after_failed_transaction() -> Result<()> {
    let (repo, _temp) = test_repository().await?;
    let failing = WalletService::new(FaultyStore {
        inner: repo.clone(),
        fail_at: FailAt::UpdateBalance,
    });
    let id = failing.create_wallet().await?.id;

    assert!(failing.apply_operation(id, "deposit", 10).await.is_err());

    // The lock taken by the failed transaction has been released
    let healthy = WalletService::new(FaultyStore {
        inner: repo,
        fail_at: FailAt::Nothing,
    });
    assert_eq!(healthy.apply_operation(id, "deposit", 10).await?, 10);
    assert_eq!(healthy.operation_history(id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_dropped_transaction_is_rolled_back() -> Result<()> {
    let (repo, _temp) = test_repository().await?;
    let id = repo.create_wallet().await?.id;

    {
        let mut tx = repo.begin().await?;
        assert_eq!(tx.lock_balance(id).await?, Some(0));
        tx.insert_operation(id, OperationType::Deposit, 25).await?;
        tx.update_balance(id, 25).await?;
        // Dropped without commit, as when a request is cancelled
    }

    assert_eq!(repo.get_balance(id).await?, Some(0));
    assert!(repo.list_operations(id).await?.is_empty());

    Ok(())
}
