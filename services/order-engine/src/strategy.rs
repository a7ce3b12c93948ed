//! Side strategies
//!
//! A strategy knows which balance an order locks at creation and how the
//! locked amount turns into an ownership transfer at match time.
//!
//! | Side | Reserve (usable only)   | Settle                                        |
//! |------|-------------------------|-----------------------------------------------|
//! | BUY  | cash by `size * price`  | cash total -= cost, asset total/usable += size |
//! | SELL | asset by `size`         | asset total -= size, cash total/usable += cost |
//!
//! `release` is the exact inverse of `reserve` and backs order cancellation.

use tracing::debug;
use types::balance::{Balance, BalanceKey};
use types::errors::EngineError;
use types::numeric::{self, Quantity};
use types::order::{CreateOrderRequest, Order, Side};

use crate::store::{modify_balance, LedgerStore};

pub trait SideStrategy: Send + Sync {
    fn side(&self) -> Side;

    /// Lock funds or inventory for a new order. Touches `usable` only.
    fn reserve(
        &self,
        ledger: &mut dyn LedgerStore,
        request: &CreateOrderRequest,
    ) -> Result<Balance, EngineError>;

    /// Hand a pending order's reservation back to `usable`
    fn release(&self, ledger: &mut dyn LedgerStore, order: &Order) -> Result<Balance, EngineError>;

    /// Move ownership for a matched order
    fn settle(&self, ledger: &mut dyn LedgerStore, order: &Order) -> Result<(), EngineError>;
}

/// Funds BUY orders from the customer's cash balance
#[derive(Debug, Default, Clone, Copy)]
pub struct BuyReservation;

/// Funds SELL orders from the customer's holding of the traded asset
#[derive(Debug, Default, Clone, Copy)]
pub struct SellReservation;

static BUY: BuyReservation = BuyReservation;
static SELL: SellReservation = SellReservation;

/// Strategy for `side`. Exhaustive over [`Side`], so every order has one.
pub fn strategy_for(side: Side) -> &'static dyn SideStrategy {
    match side {
        Side::BUY => &BUY,
        Side::SELL => &SELL,
    }
}

fn reserve_on(
    ledger: &mut dyn LedgerStore,
    key: &BalanceKey,
    amount: Quantity,
) -> Result<Balance, EngineError> {
    let balance = modify_balance(ledger, key, |b| b.reserve(amount))?;
    debug!(key = %key, amount, usable = balance.usable, "Reserved");
    Ok(balance)
}

fn release_on(
    ledger: &mut dyn LedgerStore,
    key: &BalanceKey,
    amount: Quantity,
) -> Result<Balance, EngineError> {
    let balance = modify_balance(ledger, key, |b| b.release(amount))?;
    debug!(key = %key, amount, usable = balance.usable, "Released");
    Ok(balance)
}

/// Debit the paying leg's total, then credit the receiving leg's total and
/// usable. Both rows must exist before either is written.
fn transfer(
    ledger: &mut dyn LedgerStore,
    paying: &BalanceKey,
    paid: Quantity,
    receiving: &BalanceKey,
    received: Quantity,
) -> Result<(), EngineError> {
    ensure_exists(ledger, receiving)?;
    let debited = modify_balance(ledger, paying, |b| b.debit_total(paid))?;
    let credited = modify_balance(ledger, receiving, |b| b.credit(received))?;
    debug!(
        paying = %paying,
        paid,
        paying_total = debited.total,
        receiving = %receiving,
        received,
        receiving_total = credited.total,
        "Settled"
    );
    Ok(())
}

fn ensure_exists(ledger: &mut dyn LedgerStore, key: &BalanceKey) -> Result<(), EngineError> {
    match ledger.get_balance(key)? {
        Some(_) => Ok(()),
        None => Err(EngineError::BalanceNotFound {
            customer_id: key.customer_id.clone(),
            asset: key.asset_name.clone(),
        }),
    }
}

impl SideStrategy for BuyReservation {
    fn side(&self) -> Side {
        Side::BUY
    }

    fn reserve(
        &self,
        ledger: &mut dyn LedgerStore,
        request: &CreateOrderRequest,
    ) -> Result<Balance, EngineError> {
        let cost = numeric::notional(request.size, request.price)?;
        reserve_on(ledger, &BalanceKey::cash(request.customer_id.clone()), cost)
    }

    fn release(&self, ledger: &mut dyn LedgerStore, order: &Order) -> Result<Balance, EngineError> {
        let cost = order.notional()?;
        release_on(ledger, &BalanceKey::cash(order.customer_id.clone()), cost)
    }

    fn settle(&self, ledger: &mut dyn LedgerStore, order: &Order) -> Result<(), EngineError> {
        let cost = order.notional()?;
        transfer(
            ledger,
            &BalanceKey::cash(order.customer_id.clone()),
            cost,
            &BalanceKey::new(order.customer_id.clone(), order.asset_name.clone()),
            order.size,
        )
    }
}

impl SideStrategy for SellReservation {
    fn side(&self) -> Side {
        Side::SELL
    }

    fn reserve(
        &self,
        ledger: &mut dyn LedgerStore,
        request: &CreateOrderRequest,
    ) -> Result<Balance, EngineError> {
        let key = BalanceKey::new(request.customer_id.clone(), request.asset_name.clone());
        reserve_on(ledger, &key, request.size)
    }

    fn release(&self, ledger: &mut dyn LedgerStore, order: &Order) -> Result<Balance, EngineError> {
        let key = BalanceKey::new(order.customer_id.clone(), order.asset_name.clone());
        release_on(ledger, &key, order.size)
    }

    fn settle(&self, ledger: &mut dyn LedgerStore, order: &Order) -> Result<(), EngineError> {
        let proceeds = order.notional()?;
        transfer(
            ledger,
            &BalanceKey::new(order.customer_id.clone(), order.asset_name.clone()),
            order.size,
            &BalanceKey::cash(order.customer_id.clone()),
            proceeds,
        )
    }
}
