//! Order lifecycle types
//!
//! State machine:
//! ```text
//! PENDING --cancel--------------> CANCELED (terminal)
//! PENDING --match / match pair--> MATCHED  (terminal)
//! ```

use crate::errors::{EngineError, ValidationError};
use crate::ids::{AssetName, CustomerId, OrderId};
use crate::numeric::{self, Price, Quantity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Spend cash to acquire the asset
    BUY,
    /// Give up the asset for cash
    SELL,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::BUY => f.write_str("BUY"),
            Side::SELL => f.write_str("SELL"),
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Funds/inventory reserved, waiting for a match or cancel
    PENDING,
    /// Settled (terminal)
    MATCHED,
    /// Reservation returned (terminal)
    CANCELED,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::PENDING)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::PENDING => f.write_str("PENDING"),
            OrderStatus::MATCHED => f.write_str("MATCHED"),
            OrderStatus::CANCELED => f.write_str("CANCELED"),
        }
    }
}

/// Request to place an order on behalf of a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: CustomerId,
    pub asset_name: AssetName,
    pub side: Side,
    pub size: Quantity,
    pub price: Price,
}

impl CreateOrderRequest {
    pub fn new(
        customer_id: CustomerId,
        asset_name: AssetName,
        side: Side,
        size: Quantity,
        price: Price,
    ) -> Self {
        Self {
            customer_id,
            asset_name,
            side,
            size,
            price,
        }
    }

    /// Reject malformed requests before anything is reserved.
    ///
    /// Identifiers are re-checked because deserialized values skip the
    /// constructors.
    pub fn validate(&self) -> Result<(), ValidationError> {
        CustomerId::try_new(self.customer_id.as_str())?;
        let asset = AssetName::try_new(self.asset_name.as_str())?;
        if asset.is_cash() {
            return Err(ValidationError::CashAssetNotTradable);
        }
        if self.size <= 0 {
            return Err(ValidationError::NonPositiveSize { size: self.size });
        }
        if self.price <= 0 {
            return Err(ValidationError::NonPositivePrice { price: self.price });
        }
        Ok(())
    }
}

/// An order that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub asset_name: AssetName,
    pub side: Side,
    pub size: Quantity,
    pub price: Price,
    pub create_date: DateTime<Utc>,
}

impl NewOrder {
    /// Pending order for an already reserved request
    pub fn pending(request: &CreateOrderRequest, create_date: DateTime<Utc>) -> Self {
        Self {
            customer_id: request.customer_id.clone(),
            asset_name: request.asset_name.clone(),
            side: request.side,
            size: request.size,
            price: request.price,
            create_date,
        }
    }

    /// Attach the store-assigned id
    pub fn with_id(self, id: OrderId) -> Order {
        Order {
            id,
            customer_id: self.customer_id,
            asset_name: self.asset_name,
            side: self.side,
            size: self.size,
            price: self.price,
            status: OrderStatus::PENDING,
            create_date: self.create_date,
            version: 0,
        }
    }
}

/// Persisted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub asset_name: AssetName,
    pub side: Side,
    pub size: Quantity,
    pub price: Price,
    pub status: OrderStatus,
    pub create_date: DateTime<Utc>,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub version: u64,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::PENDING
    }

    /// Cash value of the order (`size * price`)
    pub fn notional(&self) -> Result<Quantity, EngineError> {
        numeric::notional(self.size, self.price)
    }

    /// Fail with `InvalidState` unless the order is still PENDING
    pub fn ensure_pending(&self, action: &'static str) -> Result<(), EngineError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(EngineError::InvalidState {
                order_id: self.id,
                status: self.status,
                action,
            })
        }
    }

    pub fn mark_matched(&mut self) -> Result<(), EngineError> {
        self.ensure_pending("matched")?;
        self.status = OrderStatus::MATCHED;
        Ok(())
    }

    pub fn mark_canceled(&mut self) -> Result<(), EngineError> {
        self.ensure_pending("canceled")?;
        self.status = OrderStatus::CANCELED;
        Ok(())
    }
}

/// Listing filter; `None` matches everything on that dimension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub customer_id: Option<CustomerId>,
    pub status: Option<OrderStatus>,
    /// Inclusive lower bound on `create_date`
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `create_date`
    pub to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.customer_id
            .as_ref()
            .map_or(true, |c| &order.customer_id == c)
            && self.status.map_or(true, |s| order.status == s)
            && self.from.map_or(true, |from| order.create_date >= from)
            && self.to.map_or(true, |to| order.create_date < to)
    }
}
