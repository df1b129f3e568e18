use std::sync::Arc;

use skyfare_booking::{BookingEngine, WalletService};
use skyfare_directory::DirectoryService;
use skyfare_store::{DirectoryStore, LedgerStore};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration_seconds: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BookingEngine>,
    pub wallets: Arc<WalletService>,
    pub directory: Arc<DirectoryService>,
    pub ledger: Arc<dyn LedgerStore>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wires the services onto one ledger/directory store pair. The same
    /// wiring serves both backends; only the store handles differ.
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        directory_store: Arc<dyn DirectoryStore>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            engine: Arc::new(BookingEngine::new(ledger.clone(), directory_store.clone())),
            wallets: Arc::new(WalletService::new(ledger.clone())),
            directory: Arc::new(DirectoryService::new(directory_store)),
            ledger,
            auth,
        }
    }
}
