use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use types::ids::CustomerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    CUSTOMER,
    ADMIN,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Customer id of the caller
    pub sub: String,
    pub role: Role,
    pub exp: i64,
}

/// Caller identity established from a bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub customer_id: CustomerId,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::ADMIN
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only".to_string()))
        }
    }

    /// Customer a request acts for. Customers always act for themselves;
    /// admins act for whoever they name, or everyone.
    pub fn scope(&self, requested: Option<CustomerId>) -> Option<CustomerId> {
        if self.is_admin() {
            requested
        } else {
            Some(self.customer_id.clone())
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Check signature and expiry of an HS256 token
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;
    Ok(data.claims)
}

/// Mint an HS256 token for `customer_id`, valid for `ttl`
pub fn issue_token(
    secret: &str,
    customer_id: &CustomerId,
    role: Role,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: customer_id.as_str().to_string(),
        role,
        exp: (Utc::now() + ttl).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Missing authentication credentials".to_string()))?;
        let claims = verify_token(&state.jwt_secret, token)?;
        let customer_id = CustomerId::try_new(claims.sub)
            .map_err(|_| AppError::Unauthorized("Token subject is blank".to_string()))?;

        Ok(AuthenticatedUser {
            customer_id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_issue_then_verify() {
        let token = issue_token(SECRET, &CustomerId::new("C1"), Role::CUSTOMER, Duration::minutes(5)).unwrap();
        let claims = verify_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, "C1");
        assert_eq!(claims.role, Role::CUSTOMER);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(SECRET, &CustomerId::new("C1"), Role::ADMIN, Duration::minutes(5)).unwrap();
        assert!(matches!(
            verify_token("other-secret", &token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token(SECRET, &CustomerId::new("C1"), Role::ADMIN, Duration::hours(-1)).unwrap();
        assert!(matches!(verify_token(SECRET, &token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_scope() {
        let customer = AuthenticatedUser {
            customer_id: CustomerId::new("C1"),
            role: Role::CUSTOMER,
        };
        assert_eq!(customer.scope(Some(CustomerId::new("C2"))), Some(CustomerId::new("C1")));
        assert_eq!(customer.scope(None), Some(CustomerId::new("C1")));
        assert!(customer.require_admin().is_err());

        let admin = AuthenticatedUser {
            customer_id: CustomerId::new("root"),
            role: Role::ADMIN,
        };
        assert_eq!(admin.scope(None), None);
        assert_eq!(admin.scope(Some(CustomerId::new("C2"))), Some(CustomerId::new("C2")));
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn test_bearer_prefix_required() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_none());
        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));
    }
}
