use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{Balance, WalletId};

/// Operation amounts are strictly positive whole units.
pub type Amount = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Deposit,
    Withdraw,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Deposit => "deposit",
            OperationType::Withdraw => "withdraw",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(OperationType::Deposit),
            "withdraw" => Some(OperationType::Withdraw),
            _ => None,
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A logged operation. Rows are written once and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Insertion sequence; orders the audit trail.
    pub id: i64,
    pub wallet_id: WalletId,
    pub operation_type: OperationType,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

/// Reasons an operation is rejected before anything is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Unsupported operation type: expected operation_type to be \"deposit\" or \"withdraw\"")]
    InvalidOperationType(String),

    #[error("Amount must be greater than zero")]
    InvalidAmount(Amount),

    #[error("Amount {amount} would overflow balance {balance}")]
    BalanceOverflow { balance: Balance, amount: Amount },

    #[error("Insufficient funds to withdraw: balance {balance}, trying to withdraw {amount}")]
    InsufficientFunds { balance: Balance, amount: Amount },
}

/// A deposit or withdrawal whose type and amount have already been checked.
///
/// Only the resulting balance still depends on wallet state, see
/// [`OperationRequest::apply_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationRequest {
    operation_type: OperationType,
    amount: Amount,
}

impl OperationRequest {
    pub fn new(operation_type: OperationType, amount: Amount) -> Result<Self, OperationError> {
        if amount <= 0 {
            return Err(OperationError::InvalidAmount(amount));
        }
        Ok(Self {
            operation_type,
            amount,
        })
    }

    /// Parse a raw operation type. The type is checked before the amount.
    pub fn parse(operation_type: &str, amount: Amount) -> Result<Self, OperationError> {
        let operation_type = OperationType::from_str(operation_type)
            .ok_or_else(|| OperationError::InvalidOperationType(operation_type.to_string()))?;
        Self::new(operation_type, amount)
    }

    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Compute the balance after applying this operation to `balance`.
    pub fn apply_to(&self, balance: Balance) -> Result<Balance, OperationError> {
        match self.operation_type {
            OperationType::Deposit => {
                balance
                    .checked_add(self.amount)
                    .ok_or(OperationError::BalanceOverflow {
                        balance,
                        amount: self.amount,
                    })
            }
            OperationType::Withdraw => {
                let new_balance = balance - self.amount;
                if new_balance < 0 {
                    return Err(OperationError::InsufficientFunds {
                        balance,
                        amount: self.amount,
                    });
                }
                Ok(new_balance)
            }
        }
    }
}

/// Validate a raw operation against the current balance and return the new balance.
pub fn validate_operation(
    operation_type: &str,
    amount: Amount,
    current_balance: Balance,
) -> Result<Balance, OperationError> {
    OperationRequest::parse(operation_type, amount)?.apply_to(current_balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_type_parsing() {
        assert_eq!(OperationType::from_str("deposit"), Some(OperationType::Deposit));
        assert_eq!(OperationType::from_str("withdraw"), Some(OperationType::Withdraw));
        // Only the exact lowercase names are accepted
        assert_eq!(OperationType::from_str("WITHDRAW"), None);
        assert_eq!(OperationType::from_str("Deposit"), None);
        assert_eq!(OperationType::from_str(" deposit"), None);
        assert_eq!(OperationType::from_str("transfer"), None);
        assert_eq!(OperationType::from_str(""), None);
    }

    #[test]
    fn test_deposit_adds_amount() {
        assert_eq!(validate_operation("deposit", 50, 0), Ok(50));
        assert_eq!(validate_operation("deposit", 1, 99), Ok(100));
    }

    #[test]
    fn test_withdraw_subtracts_amount() {
        assert_eq!(validate_operation("withdraw", 30, 50), Ok(20));
        // Draining the wallet completely is allowed
        assert_eq!(validate_operation("withdraw", 20, 20), Ok(0));
    }

    #[test]
    fn test_withdraw_more_than_balance_is_rejected() {
        let err = validate_operation("withdraw", 100, 50).unwrap_err();
        assert_eq!(
            err,
            OperationError::InsufficientFunds {
                balance: 50,
                amount: 100
            }
        );
        assert_eq!(
            err.to_string(),
            "Insufficient funds to withdraw: balance 50, trying to withdraw 100"
        );
    }

    #[test]
    fn test_non_positive_amounts_are_rejected() {
        for op in ["deposit", "withdraw"] {
            for amount in [0, -1, -10] {
                for balance in [0, 100] {
                    assert_eq!(
                        validate_operation(op, amount, balance),
                        Err(OperationError::InvalidAmount(amount))
                    );
                }
            }
        }
    }

    #[test]
    fn test_unknown_type_is_rejected_before_amount() {
        // Both inputs are invalid; the type error wins
        let err = validate_operation("invalid", -10, 100).unwrap_err();
        assert!(matches!(err, OperationError::InvalidOperationType(ref t) if t == "invalid"));
    }

    #[test]
    fn test_request_checks_do_not_need_a_balance() {
        assert!(OperationRequest::parse("refund", 10).is_err());
        assert!(OperationRequest::parse("deposit", 0).is_err());

        let request = OperationRequest::parse("withdraw", 10).unwrap();
        assert_eq!(request.operation_type(), OperationType::Withdraw);
        assert_eq!(request.amount(), 10);
    }

    #[test]
    fn test_deposit_overflow_is_rejected() {
        let err = validate_operation("deposit", 1, Balance::MAX).unwrap_err();
        assert!(matches!(err, OperationError::BalanceOverflow { .. }));
    }
}
