use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use skyfare_domain::Wallet;
use skyfare_store::{LedgerStore, LedgerTx};

use crate::BookingError;

/// Wallet ledger operations outside the booking transaction: balance
/// reads and standalone credits/debits (top-ups). Balance changes still
/// go through the wallet's own mutators, so the non-negative invariant
/// holds here too.
pub struct WalletService {
    ledger: Arc<dyn LedgerStore>,
}

impl WalletService {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    pub async fn wallet_for_user(&self, user_id: Uuid) -> Result<Wallet, BookingError> {
        if self.ledger.user(user_id).await?.is_none() {
            return Err(BookingError::NotFound("user"));
        }
        self.ledger
            .wallet_for_user(user_id)
            .await?
            .ok_or(BookingError::MissingWallet(user_id))
    }

    /// Adds `amount` to the user's balance and returns the updated
    /// wallet. No upper bound.
    pub async fn credit(&self, user_id: Uuid, amount: Decimal) -> Result<Wallet, BookingError> {
        if self.ledger.user(user_id).await?.is_none() {
            return Err(BookingError::NotFound("user"));
        }

        let mut tx = self.ledger.begin().await?;
        let mut wallet = tx
            .wallet_for_update(user_id)
            .await?
            .ok_or(BookingError::MissingWallet(user_id))?;
        wallet.credit(amount)?;
        tx.save_wallet(&wallet).await?;
        tx.commit().await?;

        info!("credited {} to wallet of user {}", amount, user_id);
        Ok(wallet)
    }

    /// Subtracts `amount` from the user's balance, refusing to overdraw.
    pub async fn debit(&self, user_id: Uuid, amount: Decimal) -> Result<Wallet, BookingError> {
        if self.ledger.user(user_id).await?.is_none() {
            return Err(BookingError::NotFound("user"));
        }

        let mut tx = self.ledger.begin().await?;
        let mut wallet = tx
            .wallet_for_update(user_id)
            .await?
            .ok_or(BookingError::MissingWallet(user_id))?;
        wallet.debit(amount)?;
        tx.save_wallet(&wallet).await?;
        tx.commit().await?;

        info!("debited {} from wallet of user {}", amount, user_id);
        Ok(wallet)
    }

    /// Self-service top-up used by the wallet endpoint.
    pub async fn top_up(&self, user_id: Uuid, amount: Decimal) -> Result<Wallet, BookingError> {
        self.credit(user_id, amount).await
    }
}
