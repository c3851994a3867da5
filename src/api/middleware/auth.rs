use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Claims carried by bearer tokens. Tokens are issued elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

/// Authentication error responses
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Authentication required. Please log in.",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token. Please log in again.",
            ),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Admin access required."),
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

/// Extension type that holds the authenticated caller
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: Role,
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verifies an HS256 token against `secret`
pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AuthError::InvalidToken
        })
}

fn authenticate(state: &AppState, request: &Request) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(request).ok_or(AuthError::MissingToken)?;
    let claims = decode_claims(token, state.config.jwt_secret.expose_secret())?;

    Ok(AuthenticatedUser {
        user_id: claims.sub,
        role: claims.role,
    })
}

/// Middleware that requires a valid token of any role
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate(&state, &request)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Middleware that requires a valid admin token
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate(&state, &request)?;

    if user.role != Role::Admin {
        tracing::warn!(user_id = %user.user_id, "Non-admin denied admin route");
        return Err(AuthError::Forbidden);
    }

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub(crate) const TEST_SECRET: &str = "test-jwt-secret";

    pub(crate) fn token_for(role: Role, secret: &str, exp_offset_secs: i64) -> String {
        let exp = (chrono::Utc::now().timestamp() + exp_offset_secs) as usize;
        let claims = Claims {
            sub: "user-1".to_string(),
            role,
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let token = token_for(Role::Admin, TEST_SECRET, 3600);
        let claims = decode_claims(&token, TEST_SECRET).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = token_for(Role::User, "other-secret", 3600);
        assert!(matches!(
            decode_claims(&token, TEST_SECRET),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = token_for(Role::User, TEST_SECRET, -3600);
        assert!(matches!(
            decode_claims(&token, TEST_SECRET),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            decode_claims("not-a-jwt", TEST_SECRET),
            Err(AuthError::InvalidToken)
        ));
    }
}
