// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use tempfile::TempDir;
use wallet_ledger::application::WalletService;
use wallet_ledger::domain::WalletId;
use wallet_ledger::storage::Repository;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(WalletService<Repository>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = WalletService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to create a bare repository with a temporary database
pub async fn test_repository() -> Result<(Repository, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let repo = Repository::init(&format!("sqlite:{}?mode=rwc", db_path.display())).await?;
    Ok((repo, temp_dir))
}

/// Create a wallet and deposit `amount` into it (nothing when zero).
pub async fn funded_wallet(service: &WalletService<Repository>, amount: i64) -> Result<WalletId> {
    let wallet = service.create_wallet().await?;
    if amount > 0 {
        service.apply_operation(wallet.id, "deposit", amount).await?;
    }
    Ok(wallet.id)
}
