//! In-memory transactional store
//!
//! Committed rows live in shared tables behind one lock. A transaction
//! stages its writes locally (reads see its own writes) and remembers the
//! version each row had when the transaction first touched it. `commit`
//! re-checks all of those versions under the table lock and applies the
//! whole write set, or nothing.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use types::balance::{Balance, BalanceKey};
use types::errors::StoreError;
use types::ids::{AssetName, CustomerId, OrderId};
use types::numeric::Quantity;
use types::order::{NewOrder, Order, OrderFilter};

use crate::store::{LedgerStore, OrderStore, Store, UnitOfWork};

#[derive(Debug, Default)]
struct Tables {
    balances: HashMap<BalanceKey, Balance>,
    orders: BTreeMap<OrderId, Order>,
}

/// Shared in-memory ledger and order tables
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    next_order_id: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            next_order_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Insert or overwrite a fully usable balance row
    pub fn seed_balance(&self, customer_id: CustomerId, asset_name: AssetName, total: Quantity) {
        let balance = Balance::new(customer_id, asset_name, total);
        debug!(key = %balance.key(), total, "Seeding balance");
        self.tables.lock().balances.insert(balance.key(), balance);
    }

    /// Committed view of one balance
    pub fn balance(&self, key: &BalanceKey) -> Option<Balance> {
        self.tables.lock().balances.get(key).cloned()
    }

    /// Committed view of one order
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.tables.lock().orders.get(&id).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.tables.lock().orders.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    type Tx = MemoryTransaction;

    fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        Ok(MemoryTransaction {
            tables: Arc::clone(&self.tables),
            next_order_id: Arc::clone(&self.next_order_id),
            balances: HashMap::new(),
            orders: BTreeMap::new(),
            inserted: BTreeMap::new(),
        })
    }
}

/// A staged row and the committed version it was based on
#[derive(Debug)]
struct Staged<T> {
    base_version: u64,
    row: T,
}

/// Unit of work over a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryTransaction {
    tables: Arc<Mutex<Tables>>,
    next_order_id: Arc<AtomicU64>,
    balances: HashMap<BalanceKey, Staged<Balance>>,
    orders: BTreeMap<OrderId, Staged<Order>>,
    inserted: BTreeMap<OrderId, Order>,
}

fn conflict(entity: &'static str, key: impl ToString, expected: u64, actual: u64) -> StoreError {
    StoreError::Conflict {
        entity,
        key: key.to_string(),
        expected,
        actual,
    }
}

fn missing(entity: &'static str, key: impl ToString) -> StoreError {
    StoreError::Missing {
        entity,
        key: key.to_string(),
    }
}

impl LedgerStore for MemoryTransaction {
    fn get_balance(&mut self, key: &BalanceKey) -> Result<Option<Balance>, StoreError> {
        if let Some(staged) = self.balances.get(key) {
            return Ok(Some(staged.row.clone()));
        }
        Ok(self.tables.lock().balances.get(key).cloned())
    }

    fn save_balance(
        &mut self,
        mut balance: Balance,
        expected_version: u64,
    ) -> Result<Balance, StoreError> {
        let key = balance.key();
        let (current, base_version) = match self.balances.get(&key) {
            Some(staged) => (staged.row.version, staged.base_version),
            None => {
                let committed = self
                    .tables
                    .lock()
                    .balances
                    .get(&key)
                    .map(|b| b.version)
                    .ok_or_else(|| missing("balance", &key))?;
                (committed, committed)
            }
        };
        if current != expected_version {
            return Err(conflict("balance", &key, expected_version, current));
        }

        balance.version = expected_version + 1;
        self.balances.insert(
            key,
            Staged {
                base_version,
                row: balance.clone(),
            },
        );
        Ok(balance)
    }

    fn list_balances(&mut self, customer: Option<&CustomerId>) -> Result<Vec<Balance>, StoreError> {
        let mut view: BTreeMap<BalanceKey, Balance> = self
            .tables
            .lock()
            .balances
            .iter()
            .filter(|(key, _)| customer.map_or(true, |c| &key.customer_id == c))
            .map(|(key, balance)| (key.clone(), balance.clone()))
            .collect();
        for (key, staged) in &self.balances {
            if customer.map_or(true, |c| &key.customer_id == c) {
                view.insert(key.clone(), staged.row.clone());
            }
        }
        Ok(view.into_values().collect())
    }
}

impl OrderStore for MemoryTransaction {
    fn get_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        if let Some(order) = self.inserted.get(&id) {
            return Ok(Some(order.clone()));
        }
        if let Some(staged) = self.orders.get(&id) {
            return Ok(Some(staged.row.clone()));
        }
        Ok(self.tables.lock().orders.get(&id).cloned())
    }

    fn insert_order(&mut self, order: NewOrder) -> Result<Order, StoreError> {
        let id = OrderId::new(self.next_order_id.fetch_add(1, Ordering::Relaxed));
        let order = order.with_id(id);
        self.inserted.insert(id, order.clone());
        Ok(order)
    }

    fn save_order(&mut self, mut order: Order, expected_version: u64) -> Result<Order, StoreError> {
        let id = order.id;
        if let Some(fresh) = self.inserted.get_mut(&id) {
            if fresh.version != expected_version {
                return Err(conflict("order", id, expected_version, fresh.version));
            }
            order.version = expected_version + 1;
            *fresh = order.clone();
            return Ok(order);
        }

        let (current, base_version) = match self.orders.get(&id) {
            Some(staged) => (staged.row.version, staged.base_version),
            None => {
                let committed = self
                    .tables
                    .lock()
                    .orders
                    .get(&id)
                    .map(|o| o.version)
                    .ok_or_else(|| missing("order", id))?;
                (committed, committed)
            }
        };
        if current != expected_version {
            return Err(conflict("order", id, expected_version, current));
        }

        order.version = expected_version + 1;
        self.orders.insert(
            id,
            Staged {
                base_version,
                row: order.clone(),
            },
        );
        Ok(order)
    }

    fn list_orders(&mut self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
        let mut view: BTreeMap<OrderId, Order> = self
            .tables
            .lock()
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .map(|o| (o.id, o.clone()))
            .collect();
        let staged = self.orders.values().map(|s| &s.row).chain(self.inserted.values());
        for order in staged {
            if filter.matches(order) {
                view.insert(order.id, order.clone());
            } else {
                view.remove(&order.id);
            }
        }

        let mut orders: Vec<Order> = view.into_values().collect();
        orders.sort_by(|a, b| b.create_date.cmp(&a.create_date).then(b.id.cmp(&a.id)));
        Ok(orders)
    }
}

impl UnitOfWork for MemoryTransaction {
    fn commit(self) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();

        for (key, staged) in &self.balances {
            let actual = tables
                .balances
                .get(key)
                .map(|b| b.version)
                .ok_or_else(|| missing("balance", key))?;
            if actual != staged.base_version {
                return Err(conflict("balance", key, staged.base_version, actual));
            }
        }
        for (id, staged) in &self.orders {
            let actual = tables
                .orders
                .get(id)
                .map(|o| o.version)
                .ok_or_else(|| missing("order", id))?;
            if actual != staged.base_version {
                return Err(conflict("order", id, staged.base_version, actual));
            }
        }

        debug!(
            balances = self.balances.len(),
            orders = self.orders.len(),
            inserted = self.inserted.len(),
            "Committing unit of work"
        );
        for (key, staged) in self.balances {
            tables.balances.insert(key, staged.row);
        }
        for (id, staged) in self.orders {
            tables.orders.insert(id, staged.row);
        }
        tables.orders.extend(self.inserted);
        Ok(())
    }
}
