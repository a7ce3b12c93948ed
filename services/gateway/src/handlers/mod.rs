pub mod asset;
pub mod order;
