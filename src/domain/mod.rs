pub mod ports;
pub mod status;
pub mod transaction;

pub use ports::{StoreError, StoreResult, TransactionFilter, TransactionPage, TransactionStore};
pub use status::{StatusColor, StatusGroup, TrxStatus};
pub use transaction::{Transaction, TrxType, TrxUpdate};
