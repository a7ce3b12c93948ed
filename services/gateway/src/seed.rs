//! Opening balances loaded at start-up

use anyhow::{Context, Result, bail};
use order_engine::MemoryStore;
use serde::Deserialize;
use std::path::Path;
use types::ids::{AssetName, CustomerId};
use types::numeric::Quantity;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedBalance {
    pub customer_id: String,
    pub asset_name: String,
    pub total: Quantity,
}

pub fn parse_seed(json: &str) -> Result<Vec<SeedBalance>> {
    serde_json::from_str(json).context("seed file is not a list of {customerId, assetName, total}")
}

pub fn load_seed_file(path: &Path) -> Result<Vec<SeedBalance>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    parse_seed(&raw)
}

/// Validate every row, then write them all. Returns the number of rows.
pub fn apply_seed(store: &MemoryStore, rows: Vec<SeedBalance>) -> Result<usize> {
    let mut checked = Vec::with_capacity(rows.len());
    for row in rows {
        let customer_id = CustomerId::try_new(row.customer_id)?;
        let asset_name = AssetName::try_new(row.asset_name)?;
        if row.total < 0 {
            bail!("negative opening balance for {customer_id}/{asset_name}: {}", row.total);
        }
        checked.push((customer_id, asset_name, row.total));
    }

    let count = checked.len();
    for (customer_id, asset_name, total) in checked {
        store.seed_balance(customer_id, asset_name, total);
    }
    Ok(count)
}
