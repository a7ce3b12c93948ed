//! Error types for the ledger
//!
//! Every failure aborts the enclosing unit of work and reaches the caller
//! unchanged. `ErrorKind` groups the variants the way a delivery layer
//! reports them.

use thiserror::Error;

use crate::ids::{AssetName, CustomerId, OrderId};
use crate::numeric::{Price, Quantity};
use crate::order::{OrderStatus, Side};

/// Top-level engine error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    #[error("{asset} balance not found for customer {customer_id}")]
    BalanceNotFound {
        customer_id: CustomerId,
        asset: AssetName,
    },

    #[error("Customer {requester} cannot cancel another customer's order {order_id}")]
    Forbidden {
        order_id: OrderId,
        requester: CustomerId,
    },

    #[error("Only PENDING orders can be {action}: order {order_id} is {status}")]
    InvalidState {
        order_id: OrderId,
        status: OrderStatus,
        action: &'static str,
    },

    #[error("Insufficient {asset} usable balance for customer {customer_id}: required {required}, usable {usable}")]
    InsufficientFunds {
        customer_id: CustomerId,
        asset: AssetName,
        required: Quantity,
        usable: Quantity,
    },

    #[error("Invalid sides for matching: order {buy_order_id} is {buy_side}, order {sell_order_id} is {sell_side}")]
    InvalidSide {
        buy_order_id: OrderId,
        buy_side: Side,
        sell_order_id: OrderId,
        sell_side: Side,
    },

    #[error("Price mismatch between buy and sell orders: {buy_price} vs {sell_price}")]
    PriceMismatch { buy_price: Price, sell_price: Price },

    #[error("Order sizes must be equal for match: {buy_size} vs {sell_size}")]
    SizeMismatch {
        buy_size: Quantity,
        sell_size: Quantity,
    },

    #[error("Asset names must match for BUY and SELL orders: {buy_asset} vs {sell_asset}")]
    AssetMismatch {
        buy_asset: AssetName,
        sell_asset: AssetName,
    },

    #[error("Arithmetic overflow computing {operation}")]
    ArithmeticOverflow { operation: &'static str },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Request validation errors, raised before any reservation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("customer id must not be blank")]
    BlankCustomerId,

    #[error("asset name {name:?} must match [A-Z0-9_.-]+")]
    MalformedAssetName { name: String },

    #[error("size must be positive, got {size}")]
    NonPositiveSize { size: Quantity },

    #[error("price must be positive, got {price}")]
    NonPositivePrice { price: Price },

    #[error("the cash asset cannot be traded against itself")]
    CashAssetNotTradable,
}

/// Errors raised by ledger and order stores
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Version conflict on {entity} {key}: expected {expected}, found {actual}")]
    Conflict {
        entity: &'static str,
        key: String,
        expected: u64,
        actual: u64,
    },

    #[error("{entity} {key} does not exist")]
    Missing { entity: &'static str, key: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Coarse classification of an [`EngineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    ValidationFailure,
    BusinessRuleViolation,
    Conflict,
    ArithmeticOverflow,
    Unavailable,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::OrderNotFound { .. } | EngineError::BalanceNotFound { .. } => {
                ErrorKind::NotFound
            }
            EngineError::Validation(_) => ErrorKind::ValidationFailure,
            EngineError::Forbidden { .. }
            | EngineError::InvalidState { .. }
            | EngineError::InsufficientFunds { .. }
            | EngineError::InvalidSide { .. }
            | EngineError::PriceMismatch { .. }
            | EngineError::SizeMismatch { .. }
            | EngineError::AssetMismatch { .. } => ErrorKind::BusinessRuleViolation,
            EngineError::ArithmeticOverflow { .. } => ErrorKind::ArithmeticOverflow,
            EngineError::Store(StoreError::Conflict { .. }) => ErrorKind::Conflict,
            EngineError::Store(StoreError::Missing { .. }) => ErrorKind::NotFound,
            EngineError::Store(StoreError::Unavailable(_)) => ErrorKind::Unavailable,
        }
    }

    /// Only optimistic version clashes are worth retrying; the engine never
    /// retries on its own.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}
