//! HD wallet: address index, UTXO ledger and spend construction

pub mod builder;
pub mod events;
pub mod index;
pub mod ledger;
pub mod wallet;

pub use builder::{BuiltSpend, TransactionBuilder};
pub use events::{BalanceBroadcaster, BalanceEvent};
pub use index::{AddressIndex, KeyRecord, PubkeyHashRecord, PublicKeyBytes};
pub use ledger::{
    ApplyFailure, ApplyReport, Ledger, PendingSpendRecord, StoredTransaction, UnspentOutputRecord,
};
pub use wallet::{
    SharedWallet, Wallet, WalletError, PENDING_TABLE, TRANSACTIONS_TABLE, UNSPENT_TABLE,
};
