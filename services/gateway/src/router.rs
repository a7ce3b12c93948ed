use crate::handlers::{asset, order};
use crate::state::AppState;
use axum::{
    Json, Router,
    body::Body,
    http::Request,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

async fn health() -> Json<Value> {
    Json(json!({ "ok": true, "service": "gateway" }))
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/orders", post(order::create_order).get(order::list_orders))
        .route("/orders/match", post(order::match_orders))
        .route("/orders/{id}/cancel", post(order::cancel_order))
        .route("/orders/{id}/match", put(order::match_order))
        .route("/assets", get(asset::list_assets));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                request_id = %Uuid::now_v7(),
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, issue_token};
    use crate::config::RateLimitConfig;
    use axum::http::{Method, StatusCode, header};
    use http_body_util::BodyExt;
    use order_engine::MemoryStore;
    use std::sync::Arc;
    use tower::ServiceExt;
    use types::ids::{AssetName, CustomerId};

    const SECRET: &str = "router-test-secret";

    fn app_with_limits(limits: RateLimitConfig) -> Router {
        let store = MemoryStore::new();
        for customer in ["C1", "C2"] {
            store.seed_balance(CustomerId::new(customer), AssetName::cash(), 1_000_000);
            store.seed_balance(CustomerId::new(customer), AssetName::new("AAPL"), 100);
        }
        create_router(AppState::new(Arc::new(store), SECRET, limits))
    }

    fn app() -> Router {
        app_with_limits(RateLimitConfig::default())
    }

    fn token(customer: &str, role: Role) -> String {
        issue_token(SECRET, &CustomerId::new(customer), role, chrono::Duration::minutes(5)).unwrap()
    }

    fn request(method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(bearer) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {bearer}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn place(app: &Router, bearer: &str, body: Value) -> (StatusCode, Value) {
        call(app, request(Method::POST, "/api/orders", Some(bearer), Some(body))).await
    }

    fn buy(size: i64, price: i64) -> Value {
        json!({ "assetName": "AAPL", "side": "BUY", "size": size, "price": price })
    }

    fn sell(size: i64, price: i64) -> Value {
        json!({ "assetName": "AAPL", "side": "SELL", "size": size, "price": price })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), request(Method::GET, "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (status, body) = call(&app(), request(Method::GET, "/api/orders", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);
    }

    #[tokio::test]
    async fn test_forged_token_is_unauthorized() {
        let forged = issue_token("not-the-secret", &CustomerId::new("C1"), Role::ADMIN, chrono::Duration::minutes(5)).unwrap();
        let (status, _) = call(&app(), request(Method::GET, "/api/assets", Some(&forged), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_customer_orders_for_self_only() {
        let app = app();
        let c1 = token("C1", Role::CUSTOMER);
        let mut body = buy(10, 100);
        body["customerId"] = json!("C2");

        let (status, order) = place(&app, &c1, body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["customerId"], "C1");
        assert_eq!(order["status"], "PENDING");
        assert_eq!(order["size"], 10);
        assert!(order.get("version").is_none());

        let (_, assets) = call(&app, request(Method::GET, "/api/assets", Some(&c1), None)).await;
        let cash = assets
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["assetName"] == "TRY")
            .unwrap()
            .clone();
        assert_eq!(cash["size"], 1_000_000);
        assert_eq!(cash["usableSize"], 999_000);
    }

    #[tokio::test]
    async fn test_admin_orders_on_behalf() {
        let app = app();
        let admin = token("admin", Role::ADMIN);
        let mut body = sell(5, 10);
        body["customerId"] = json!("C2");

        let (status, order) = place(&app, &admin, body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["customerId"], "C2");
    }

    #[tokio::test]
    async fn test_listing_is_scoped_for_customers() {
        let app = app();
        place(&app, &token("C1", Role::CUSTOMER), buy(1, 1)).await;
        place(&app, &token("C2", Role::CUSTOMER), buy(1, 1)).await;

        let c1 = token("C1", Role::CUSTOMER);
        let (_, mine) = call(&app, request(Method::GET, "/api/orders?customerId=C2", Some(&c1), None)).await;
        let mine = mine.as_array().unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0]["customerId"], "C1");

        let admin = token("admin", Role::ADMIN);
        let (_, all) = call(&app, request(Method::GET, "/api/orders", Some(&admin), None)).await;
        assert_eq!(all.as_array().unwrap().len(), 2);
        let (_, pending) = call(&app, request(Method::GET, "/api/orders?status=PENDING&customerId=C2", Some(&admin), None)).await;
        assert_eq!(pending.as_array().unwrap().len(), 1);

        let (_, balances) = call(&app, request(Method::GET, "/api/assets", Some(&admin), None)).await;
        assert_eq!(balances.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let app = app();
        let c1 = token("C1", Role::CUSTOMER);
        let c2 = token("C2", Role::CUSTOMER);
        let (_, order) = place(&app, &c1, buy(10, 100)).await;
        let cancel_uri = format!("/api/orders/{}/cancel", order["id"]);

        let (status, body) = call(&app, request(Method::POST, &cancel_uri, Some(&c2), None)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["title"], "Business Rule Violated");

        let (status, body) = call(&app, request(Method::POST, &cancel_uri, Some(&c1), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "CANCELED");

        let (status, _) = call(&app, request(Method::POST, &cancel_uri, Some(&c1), None)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = call(&app, request(Method::POST, "/api/orders/999/cancel", Some(&c1), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["title"], "Not Found");

        let (status, _) = call(&app, request(Method::POST, "/api/orders/abc/cancel", Some(&c1), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_match_routes_are_admin_only() {
        let app = app();
        let c1 = token("C1", Role::CUSTOMER);
        let (_, order) = place(&app, &c1, buy(1, 10)).await;

        let uri = format!("/api/orders/{}/match", order["id"]);
        let (status, body) = call(&app, request(Method::PUT, &uri, Some(&c1), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["status"], 403);

        let pair = json!({ "buyOrderId": 1, "sellOrderId": 2 });
        let (status, _) = call(&app, request(Method::POST, "/api/orders/match", Some(&c1), Some(pair))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let admin = token("admin", Role::ADMIN);
        let (status, body) = call(&app, request(Method::PUT, &uri, Some(&admin), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "MATCHED");
    }

    #[tokio::test]
    async fn test_pair_match() {
        let app = app();
        let (_, buy_order) = place(&app, &token("C1", Role::CUSTOMER), buy(10, 100)).await;
        let (_, sell_order) = place(&app, &token("C2", Role::CUSTOMER), sell(10, 100)).await;

        let admin = token("admin", Role::ADMIN);
        let pair = json!({ "buyOrderId": buy_order["id"], "sellOrderId": sell_order["id"] });
        let (status, body) = call(&app, request(Method::POST, "/api/orders/match", Some(&admin), Some(pair))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Orders matched successfully");
        assert_eq!(body["buyOrder"]["status"], "MATCHED");
        assert_eq!(body["sellOrder"]["status"], "MATCHED");

        let mismatched = json!({ "buyOrderId": sell_order["id"], "sellOrderId": buy_order["id"] });
        let (status, _) = call(&app, request(Method::POST, "/api/orders/match", Some(&admin), Some(mismatched))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_create_error_mapping() {
        let app = app();
        let c1 = token("C1", Role::CUSTOMER);

        let (status, body) = place(&app, &c1, buy(0, 100)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["title"], "Validation Failed");

        let (status, _) = place(&app, &c1, json!({ "assetName": "aapl", "side": "BUY", "size": 1, "price": 1 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = place(&app, &c1, json!({ "assetName": "AAPL", "side": "HOLD", "size": 1, "price": 1 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = place(&app, &c1, sell(101, 1)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("Insufficient"));

        let (status, _) = place(&app, &c1, buy(i64::MAX, 2)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_rate_limited_placement() {
        let app = app_with_limits(RateLimitConfig {
            capacity: 1,
            refill_per_sec: 0.001,
        });
        let c1 = token("C1", Role::CUSTOMER);
        let (status, _) = place(&app, &c1, buy(1, 1)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = place(&app, &c1, buy(1, 1)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["status"], 429);
    }
}
