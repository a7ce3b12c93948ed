use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{AssetResponse, ListAssetsQuery, optional_customer};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

pub async fn list_assets(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    query: Result<Query<ListAssetsQuery>, QueryRejection>,
) -> Result<Json<Vec<AssetResponse>>, AppError> {
    state
        .rate_limiter
        .check_rate_limit(&format!("{}:asset_query", user.customer_id))?;
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let customer = user.scope(optional_customer(query.customer_id));
    let balances = state.engine.list_balances(customer.as_ref())?;
    Ok(Json(balances.into_iter().map(AssetResponse::from).collect()))
}
