//! Identifier types for ledger entities
//!
//! Orders are keyed by a store-assigned number; balances are keyed by the
//! `(CustomerId, AssetName)` pair.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

/// Name of the cash leg that funds every BUY and receives every SELL.
pub const CASH_ASSET: &str = "TRY";

/// Unique identifier for an order
///
/// Assigned by the order store on insert. Ids are strictly increasing in
/// insertion order but may have gaps (aborted inserts consume an id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the customer owning balances and orders
///
/// Opaque to the ledger; the delivery layer maps authenticated principals
/// onto it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Create a customer id
    ///
    /// # Panics
    /// Panics if the id is blank
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        assert!(!id.trim().is_empty(), "CustomerId must not be blank");
        Self(id)
    }

    /// Try to create a customer id, rejecting blank input
    pub fn try_new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::BlankCustomerId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Name of a held asset (ticker), e.g. "AAPL" or "TRY"
///
/// Format: one or more of `A-Z`, `0-9`, `_`, `.`, `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetName(String);

impl AssetName {
    /// Create an asset name
    ///
    /// # Panics
    /// Panics if the name is not a valid ticker
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(is_valid_ticker(&name), "AssetName must match [A-Z0-9_.-]+");
        Self(name)
    }

    /// Try to create an asset name, returning a validation error if malformed
    pub fn try_new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if is_valid_ticker(&name) {
            Ok(Self(name))
        } else {
            Err(ValidationError::MalformedAssetName { name })
        }
    }

    /// The cash leg
    pub fn cash() -> Self {
        Self(CASH_ASSET.to_string())
    }

    pub fn is_cash(&self) -> bool {
        self.0 == CASH_ASSET
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn is_valid_ticker(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || matches!(b, b'_' | b'.' | b'-'))
}
