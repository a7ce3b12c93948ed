use chrono::{DateTime, Utc};
use order_engine::MatchedPair;
use serde::{Deserialize, Serialize};
use types::balance::Balance;
use types::ids::{AssetName, CustomerId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Honoured for admins only; customers always order for themselves
    pub customer_id: Option<String>,
    pub asset_name: String,
    pub side: Side,
    pub size: Quantity,
    pub price: Price,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    pub customer_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssetsQuery {
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOrdersRequest {
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOrdersResponse {
    pub buy_order: Order,
    pub sell_order: Order,
    pub message: String,
}

impl From<MatchedPair> for MatchOrdersResponse {
    fn from(pair: MatchedPair) -> Self {
        Self {
            buy_order: pair.buy_order,
            sell_order: pair.sell_order,
            message: "Orders matched successfully".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetResponse {
    pub customer_id: CustomerId,
    pub asset_name: AssetName,
    pub size: Quantity,
    pub usable_size: Quantity,
}

impl From<Balance> for AssetResponse {
    fn from(balance: Balance) -> Self {
        Self {
            customer_id: balance.customer_id,
            asset_name: balance.asset_name,
            size: balance.total,
            usable_size: balance.usable,
        }
    }
}

/// Parse an optional customer id from a query string; blank means absent
pub fn optional_customer(raw: Option<String>) -> Option<CustomerId> {
    raw.and_then(|id| CustomerId::try_new(id).ok())
}
