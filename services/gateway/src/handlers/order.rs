use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{
    CreateOrderRequest, ListOrdersQuery, MatchOrdersRequest, MatchOrdersResponse, optional_customer,
};
use crate::state::AppState;
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use types::ids::{AssetName, CustomerId, OrderId};
use types::order::{self, Order, OrderFilter};

fn order_id(path: Result<Path<u64>, PathRejection>) -> Result<OrderId, AppError> {
    let Path(id) = path.map_err(|e| AppError::BadRequest(e.body_text()))?;
    Ok(OrderId::new(id))
}

pub async fn create_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<Order>, AppError> {
    state
        .rate_limiter
        .check_rate_limit(&format!("{}:order_placement", user.customer_id))?;
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    // Customers cannot place orders for anyone else
    let customer_id = match payload.customer_id {
        Some(requested) if user.is_admin() => CustomerId::try_new(requested)?,
        _ => user.customer_id.clone(),
    };
    let request = order::CreateOrderRequest::new(
        customer_id,
        AssetName::try_new(payload.asset_name)?,
        payload.side,
        payload.size,
        payload.price,
    );

    Ok(Json(state.engine.create_order(request)?))
}

pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<Vec<Order>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let filter = OrderFilter {
        customer_id: user.scope(optional_customer(query.customer_id)),
        status: query.status,
        from: query.from,
        to: query.to,
    };
    Ok(Json(state.engine.list_orders(&filter)?))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<Order>, AppError> {
    state
        .rate_limiter
        .check_rate_limit(&format!("{}:order_cancel", user.customer_id))?;
    let order_id = order_id(path)?;

    let order = state
        .engine
        .cancel_order(order_id, &user.customer_id, user.is_admin())?;
    Ok(Json(order))
}

pub async fn match_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<Order>, AppError> {
    user.require_admin()?;
    let order_id = order_id(path)?;
    Ok(Json(state.engine.match_order(order_id)?))
}

pub async fn match_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: Result<Json<MatchOrdersRequest>, JsonRejection>,
) -> Result<Json<MatchOrdersResponse>, AppError> {
    user.require_admin()?;
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let pair = state
        .engine
        .match_pair(payload.buy_order_id, payload.sell_order_id)?;
    Ok(Json(pair.into()))
}
