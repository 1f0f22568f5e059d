use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type WalletId = Uuid;

/// Balances are whole currency units and never go below zero once committed.
pub type Balance = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub balance: Balance,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// A fresh wallet starts empty.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            balance: 0,
            created_at: Utc::now(),
        }
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}
