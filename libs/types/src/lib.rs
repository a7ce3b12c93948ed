//! Types library for the brokerage ledger
//!
//! Entity definitions and invariants shared by the order engine and the
//! delivery layer. Nothing in here performs I/O.
//!
//! # Modules
//! - `ids`: Identifiers (OrderId, CustomerId, AssetName)
//! - `numeric`: Integer quantities and checked notional arithmetic
//! - `balance`: Per-customer, per-asset total/usable balances
//! - `order`: Order lifecycle types, requests and listing filters
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod balance;
pub mod order;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::balance::*;
    pub use crate::order::*;
    pub use crate::errors::*;
}
