use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user stored-value account. The balance field is private on purpose:
/// `credit` and `debit` are the only mutators in the whole system, so the
/// `balance >= 0` invariant is enforced in exactly one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Fresh wallet with a zero balance, as created at registration.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            balance: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    /// Rehydrates a wallet from stored columns. Storage backends are the
    /// only intended callers; everything else must go through
    /// `credit`/`debit`.
    pub fn from_parts(id: Uuid, user_id: Uuid, balance: Decimal, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            balance,
            updated_at,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Adds `amount` to the balance. Rejects non-positive amounts; there is
    /// no upper bound.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), WalletError> {
        if amount <= Decimal::ZERO {
            return Err(WalletError::NonPositiveAmount(amount));
        }
        self.balance += amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Subtracts `amount` from the balance. Rejects non-positive amounts
    /// and any debit that would take the balance below zero.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), WalletError> {
        if amount <= Decimal::ZERO {
            return Err(WalletError::NonPositiveAmount(amount));
        }
        if self.balance < amount {
            return Err(WalletError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },
}
