//! Order engine
//!
//! Owns the order lifecycle and runs every public operation as one unit of
//! work: the store transaction is committed only when the whole operation
//! succeeds, and any error drops it, discarding every staged write.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use types::balance::{Balance, BalanceKey};
use types::errors::EngineError;
use types::ids::{CustomerId, OrderId};
use types::order::{CreateOrderRequest, NewOrder, Order, OrderFilter, Side};

use crate::store::{modify_balance, LedgerStore, OrderStore, Store, UnitOfWork};
use crate::strategy::strategy_for;

/// Source of order creation timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Both legs of a pair match, as persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPair {
    pub buy_order: Order,
    pub sell_order: Order,
}

/// Order lifecycle orchestrator
pub struct OrderEngine<S: Store> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: Store> OrderEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run `work` inside a fresh unit of work and commit it on success
    fn in_unit_of_work<T>(
        &self,
        operation: &'static str,
        work: impl FnOnce(&mut S::Tx) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let outcome = self.store.begin().map_err(EngineError::from).and_then(|mut tx| {
            let value = work(&mut tx)?;
            tx.commit()?;
            Ok(value)
        });
        if let Err(err) = &outcome {
            warn!(
                operation,
                kind = ?err.kind(),
                retryable = err.is_retryable(),
                error = %err,
                "Operation rejected"
            );
        }
        outcome
    }

    /// Reserve funds or inventory for `request` and persist a PENDING order
    pub fn create_order(&self, request: CreateOrderRequest) -> Result<Order, EngineError> {
        let order = self.in_unit_of_work("create_order", |tx| {
            request.validate()?;
            strategy_for(request.side).reserve(tx, &request)?;
            Ok(tx.insert_order(NewOrder::pending(&request, self.clock.now()))?)
        })?;

        info!(
            order_id = %order.id,
            customer_id = %order.customer_id,
            asset = %order.asset_name,
            side = %order.side,
            size = order.size,
            price = order.price,
            "Order created"
        );
        Ok(order)
    }

    /// Cancel a PENDING order and return its reservation.
    ///
    /// Unless `is_privileged`, only the owning customer may cancel.
    pub fn cancel_order(
        &self,
        order_id: OrderId,
        requester: &CustomerId,
        is_privileged: bool,
    ) -> Result<Order, EngineError> {
        let order = self.in_unit_of_work("cancel_order", |tx| {
            let mut order = load_order(tx, order_id)?;
            if !is_privileged && &order.customer_id != requester {
                return Err(EngineError::Forbidden {
                    order_id,
                    requester: requester.clone(),
                });
            }
            order.ensure_pending("canceled")?;

            strategy_for(order.side).release(tx, &order)?;
            let expected = order.version;
            order.mark_canceled()?;
            Ok(tx.save_order(order, expected)?)
        })?;

        info!(order_id = %order.id, requester = %requester, "Order canceled");
        Ok(order)
    }

    /// Settle a single PENDING order against its owner's own balances
    pub fn match_order(&self, order_id: OrderId) -> Result<Order, EngineError> {
        let order = self.in_unit_of_work("match_order", |tx| {
            let mut order = load_order(tx, order_id)?;
            order.ensure_pending("matched")?;

            strategy_for(order.side).settle(tx, &order)?;
            let expected = order.version;
            order.mark_matched()?;
            Ok(tx.save_order(order, expected)?)
        })?;

        info!(order_id = %order.id, side = %order.side, "Order matched");
        Ok(order)
    }

    /// Settle a BUY and a SELL order against each other.
    ///
    /// Only the receiving legs are credited (buyer's asset, seller's cash);
    /// neither paying leg's total is debited.
    pub fn match_pair(
        &self,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
    ) -> Result<MatchedPair, EngineError> {
        let pair = self.in_unit_of_work("match_pair", |tx| {
            let mut buy = load_order(tx, buy_order_id)?;
            let mut sell = load_order(tx, sell_order_id)?;
            check_pair(&buy, &sell)?;

            let proceeds = sell.notional()?;
            modify_balance(
                tx,
                &BalanceKey::new(buy.customer_id.clone(), buy.asset_name.clone()),
                |b| b.credit(buy.size),
            )?;
            modify_balance(tx, &BalanceKey::cash(sell.customer_id.clone()), |b| {
                b.credit(proceeds)
            })?;

            let (buy_version, sell_version) = (buy.version, sell.version);
            buy.mark_matched()?;
            sell.mark_matched()?;
            Ok(MatchedPair {
                buy_order: tx.save_order(buy, buy_version)?,
                sell_order: tx.save_order(sell, sell_version)?,
            })
        })?;

        info!(
            buy_order_id = %pair.buy_order.id,
            sell_order_id = %pair.sell_order.id,
            asset = %pair.buy_order.asset_name,
            size = pair.buy_order.size,
            price = pair.buy_order.price,
            "Order pair matched"
        );
        Ok(pair)
    }

    /// Orders matching `filter`, newest first. Read-only.
    pub fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, EngineError> {
        let mut tx = self.store.begin()?;
        Ok(tx.list_orders(filter)?)
    }

    /// Balances of one customer, or of everyone. Read-only.
    pub fn list_balances(&self, customer: Option<&CustomerId>) -> Result<Vec<Balance>, EngineError> {
        let mut tx = self.store.begin()?;
        Ok(tx.list_balances(customer)?)
    }
}

fn load_order(tx: &mut impl OrderStore, order_id: OrderId) -> Result<Order, EngineError> {
    tx.get_order(order_id)?
        .ok_or(EngineError::OrderNotFound { order_id })
}

/// Pair-match preconditions, checked in order, first failure wins
fn check_pair(buy: &Order, sell: &Order) -> Result<(), EngineError> {
    buy.ensure_pending("matched")?;
    sell.ensure_pending("matched")?;
    if buy.side != Side::BUY || sell.side != Side::SELL {
        return Err(EngineError::InvalidSide {
            buy_order_id: buy.id,
            buy_side: buy.side,
            sell_order_id: sell.id,
            sell_side: sell.side,
        });
    }
    if buy.price != sell.price {
        return Err(EngineError::PriceMismatch {
            buy_price: buy.price,
            sell_price: sell.price,
        });
    }
    if buy.size != sell.size {
        return Err(EngineError::SizeMismatch {
            buy_size: buy.size,
            sell_size: sell.size,
        });
    }
    if buy.asset_name != sell.asset_name {
        return Err(EngineError::AssetMismatch {
            buy_asset: buy.asset_name.clone(),
            sell_asset: sell.asset_name.clone(),
        });
    }
    Ok(())
}
