//! Store capabilities consumed by the engine
//!
//! The engine never talks to a database directly. It opens a unit of work,
//! reads and writes balances/orders through it with explicit expected
//! versions, then commits. Dropping a unit of work without committing
//! discards every staged write.

use types::balance::{Balance, BalanceKey};
use types::errors::{EngineError, StoreError};
use types::ids::{CustomerId, OrderId};
use types::order::{NewOrder, Order, OrderFilter};

/// Balance rows keyed by `(customer, asset)`
pub trait LedgerStore {
    fn get_balance(&mut self, key: &BalanceKey) -> Result<Option<Balance>, StoreError>;

    /// Compare-and-swap write. Fails with `StoreError::Conflict` if the row
    /// is no longer at `expected_version`. Returns the row as written, with
    /// its new version.
    fn save_balance(&mut self, balance: Balance, expected_version: u64)
        -> Result<Balance, StoreError>;

    /// All balances of one customer, or every balance when `customer` is `None`
    fn list_balances(&mut self, customer: Option<&CustomerId>) -> Result<Vec<Balance>, StoreError>;
}

/// Order rows keyed by id
pub trait OrderStore {
    fn get_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Insert a new PENDING order, assigning its id
    fn insert_order(&mut self, order: NewOrder) -> Result<Order, StoreError>;

    /// Compare-and-swap write, same contract as [`LedgerStore::save_balance`]
    fn save_order(&mut self, order: Order, expected_version: u64) -> Result<Order, StoreError>;

    /// Orders matching `filter`, newest `create_date` first
    fn list_orders(&mut self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError>;
}

/// One atomic unit of work over both stores
pub trait UnitOfWork: LedgerStore + OrderStore {
    /// Apply every staged write, or none of them
    fn commit(self) -> Result<(), StoreError>;
}

/// Factory for units of work
pub trait Store: Send + Sync {
    type Tx: UnitOfWork + 'static;

    fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// Read a balance, apply `change`, and write it back at the version it was
/// read at.
pub fn modify_balance(
    ledger: &mut dyn LedgerStore,
    key: &BalanceKey,
    change: impl FnOnce(&mut Balance) -> Result<(), EngineError>,
) -> Result<Balance, EngineError> {
    let mut balance = ledger
        .get_balance(key)?
        .ok_or_else(|| EngineError::BalanceNotFound {
            customer_id: key.customer_id.clone(),
            asset: key.asset_name.clone(),
        })?;
    let expected = balance.version;
    change(&mut balance)?;
    Ok(ledger.save_balance(balance, expected)?)
}
