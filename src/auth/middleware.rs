use axum::{
    async_trait,
    extract::FromRequestParts,
    headers::{authorization::Bearer, Authorization},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
    RequestPartsExt, TypedHeader,
};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use super::jwt::{jwt_secret, validate_token};

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: String,
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(AuthErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Authentication middleware to protect routes
pub async fn auth_middleware<B>(req: Request<B>, next: Next<B>) -> Result<Response, Response> {
    let (mut parts, body) = req.into_parts();

    // Extract the token from the Authorization header
    let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(e) => {
            error!("Authorization header extraction failed: {:?}", e);
            return Err(unauthorized(
                "Missing or invalid Authorization header. Please provide a Bearer token",
            ));
        }
    };

    let secret = match jwt_secret() {
        Ok(secret) => secret,
        Err(e) => {
            error!("JWT secret unavailable: {}", e);
            return Err((StatusCode::INTERNAL_SERVER_ERROR).into_response());
        }
    };

    let claims = match validate_token(bearer.token(), &secret) {
        Ok(claims) => claims,
        Err(e) => {
            error!("Token validation failed: {:?}", e);
            return Err(unauthorized("Invalid token. Please login again"));
        }
    };

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(user_id) => user_id,
        Err(e) => {
            error!("User ID parsing failed: {:?}", e);
            return Err(unauthorized("Invalid user identifier in token"));
        }
    };

    // Make the authenticated user visible to handlers
    parts.extensions.insert(AuthUser { user_id });

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Extractor for authenticated user
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| unauthorized("Authentication required"))
    }
}

/// Optional authentication middleware for public routes that need auth info
pub async fn optional_auth_middleware<B>(req: Request<B>, next: Next<B>) -> Response {
    let (mut parts, body) = req.into_parts();

    // Extract the token from the Authorization header if present
    if let Ok(TypedHeader(Authorization(bearer))) =
        parts.extract::<TypedHeader<Authorization<Bearer>>>().await
    {
        if let Ok(secret) = jwt_secret() {
            if let Ok(claims) = validate_token(bearer.token(), &secret) {
                if let Ok(user_id) = Uuid::parse_str(&claims.sub) {
                    parts.extensions.insert(AuthUser { user_id });
                }
            }
        }
    }

    let req = Request::from_parts(parts, body);
    next.run(req).await
}
