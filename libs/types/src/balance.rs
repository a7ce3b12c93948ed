//! Per-customer, per-asset balances
//!
//! `total` is what the customer actually holds; `usable` is the part not
//! reserved by pending orders.
//!
//! Invariant: 0 <= usable <= total after every successful operation

use crate::errors::EngineError;
use crate::ids::{AssetName, CustomerId};
use crate::numeric::Quantity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store key of a balance row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BalanceKey {
    pub customer_id: CustomerId,
    pub asset_name: AssetName,
}

impl BalanceKey {
    pub fn new(customer_id: CustomerId, asset_name: AssetName) -> Self {
        Self {
            customer_id,
            asset_name,
        }
    }

    /// The customer's cash leg
    pub fn cash(customer_id: CustomerId) -> Self {
        Self::new(customer_id, AssetName::cash())
    }
}

impl fmt::Display for BalanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.customer_id, self.asset_name)
    }
}

/// Balance of one asset for one customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub customer_id: CustomerId,
    pub asset_name: AssetName,
    #[serde(rename = "size")]
    pub total: Quantity,
    #[serde(rename = "usableSize")]
    pub usable: Quantity,
    /// Optimistic concurrency version, bumped by the store on every write
    pub version: u64,
}

impl Balance {
    /// Create a fully usable balance
    pub fn new(customer_id: CustomerId, asset_name: AssetName, total: Quantity) -> Self {
        Self {
            customer_id,
            asset_name,
            total,
            usable: total,
            version: 0,
        }
    }

    pub fn key(&self) -> BalanceKey {
        BalanceKey::new(self.customer_id.clone(), self.asset_name.clone())
    }

    /// Check balance invariant: 0 <= usable <= total
    pub fn check_invariant(&self) -> bool {
        0 <= self.usable && self.usable <= self.total
    }

    /// Set aside `amount` of the usable balance for a pending order.
    /// `total` is untouched.
    pub fn reserve(&mut self, amount: Quantity) -> Result<(), EngineError> {
        let remaining = self.usable.checked_sub(amount).ok_or(EngineError::ArithmeticOverflow {
            operation: "usable - reservation",
        })?;
        if remaining < 0 {
            return Err(EngineError::InsufficientFunds {
                customer_id: self.customer_id.clone(),
                asset: self.asset_name.clone(),
                required: amount,
                usable: self.usable,
            });
        }
        self.usable = remaining;
        Ok(())
    }

    /// Give a reservation back to the usable balance (order canceled)
    pub fn release(&mut self, amount: Quantity) -> Result<(), EngineError> {
        self.usable = self.usable.checked_add(amount).ok_or(EngineError::ArithmeticOverflow {
            operation: "usable + release",
        })?;
        Ok(())
    }

    /// Remove `amount` from what the customer holds. The usable part was
    /// already consumed by the matching reservation.
    pub fn debit_total(&mut self, amount: Quantity) -> Result<(), EngineError> {
        self.total = self.total.checked_sub(amount).ok_or(EngineError::ArithmeticOverflow {
            operation: "total - debit",
        })?;
        Ok(())
    }

    /// Credit both total and usable (receiving leg of a settlement)
    pub fn credit(&mut self, amount: Quantity) -> Result<(), EngineError> {
        let total = self.total.checked_add(amount).ok_or(EngineError::ArithmeticOverflow {
            operation: "total + credit",
        })?;
        let usable = self.usable.checked_add(amount).ok_or(EngineError::ArithmeticOverflow {
            operation: "usable + credit",
        })?;
        self.total = total;
        self.usable = usable;
        Ok(())
    }
}
