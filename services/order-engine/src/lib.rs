//! Order Engine Service
//!
//! Balance reservation and order settlement. Every customer holds one
//! balance per asset with a `total` and a `usable` part; orders lock
//! `usable` when placed and move `total` when matched.
//!
//! **Key Invariants:**
//! - `0 <= usable <= total` after every successful operation
//! - Orders leave PENDING exactly once, to MATCHED or CANCELED
//! - Cancel is the exact inverse of the creating reservation
//! - A failed operation leaves no trace in either store

pub mod store;
pub mod memory;
pub mod strategy;
pub mod engine;

pub use engine::{Clock, MatchedPair, OrderEngine, SystemClock};
pub use memory::MemoryStore;
pub use store::{LedgerStore, OrderStore, Store, UnitOfWork};
pub use strategy::{strategy_for, BuyReservation, SellReservation, SideStrategy};
