use thiserror::Error;

use crate::domain::{OperationError, WalletId};

/// How a failure should be reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    NotFound,
    PaymentRequired,
    Internal,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid wallet ID")]
    InvalidWalletId(String),

    #[error("Wallet not found")]
    WalletNotFound(WalletId),

    #[error(transparent)]
    Rejected(#[from] OperationError),

    /// Any store-level failure. The message is for logs only.
    #[error("Storage transaction failed: {0:#}")]
    TransactionFailure(#[from] anyhow::Error),
}

impl AppError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::InvalidWalletId(_) => ErrorClass::BadRequest,
            AppError::WalletNotFound(_) => ErrorClass::NotFound,
            AppError::Rejected(OperationError::InsufficientFunds { .. }) => {
                ErrorClass::PaymentRequired
            }
            AppError::Rejected(_) => ErrorClass::BadRequest,
            AppError::TransactionFailure(_) => ErrorClass::Internal,
        }
    }

    /// Message safe to show to a client. Internal details are never included.
    pub fn public_message(&self) -> String {
        match self.class() {
            ErrorClass::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}
