use axum::http::StatusCode;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued at
}

/// Generate a JWT token for a user
pub fn generate_token(user_id: &Uuid, secret: &str) -> Result<String, JwtError> {
    let now = Utc::now();
    let expiry = now + Duration::hours(24); // 24 hour expiration

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiry.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| JwtError::TokenCreation)
}

/// Validate a JWT token and extract claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_e| JwtError::InvalidToken)?;

    Ok(token_data.claims)
}

/// Read the signing secret from the environment
pub fn jwt_secret() -> Result<String, JwtError> {
    std::env::var("JWT_SECRET").map_err(|_| JwtError::MissingSecret)
}

#[derive(Debug)]
pub enum JwtError {
    MissingSecret,
    TokenCreation,
    InvalidToken,
}

impl fmt::Display for JwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JwtError::MissingSecret => write!(f, "JWT secret is missing or not set"),
            JwtError::TokenCreation => write!(f, "Failed to create JWT token"),
            JwtError::InvalidToken => write!(f, "Invalid or expired JWT token"),
        }
    }
}

impl From<JwtError> for StatusCode {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::MissingSecret => StatusCode::INTERNAL_SERVER_ERROR,
            JwtError::TokenCreation => StatusCode::INTERNAL_SERVER_ERROR,
            JwtError::InvalidToken => StatusCode::UNAUTHORIZED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret";

    #[test]
    fn test_jwt_token_generation_and_validation() {
        let user_id = Uuid::new_v4();

        let token = generate_token(&user_id, SECRET).expect("Token generation failed");
        assert!(!token.is_empty());

        let claims = validate_token(&token, SECRET).expect("Token validation failed");
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn test_wrong_secret_rejection() {
        let user_id = Uuid::new_v4();
        let token = generate_token(&user_id, SECRET).unwrap();

        let result = validate_token(&token, "other_secret");
        match result {
            Err(JwtError::InvalidToken) => (),
            _ => panic!("Expected InvalidToken error"),
        }
    }

    #[test]
    fn test_token_tampering() {
        let user_id = Uuid::new_v4();
        let token = generate_token(&user_id, SECRET).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3, "JWT should have 3 parts");

        let tampered_token = format!("{}.{}tampered.{}", parts[0], parts[1], parts[2]);

        let result = validate_token(&tampered_token, SECRET);
        assert!(result.is_err());
        match result {
            Err(JwtError::InvalidToken) => {}
            _ => panic!("Expected InvalidToken error"),
        }
    }

    #[test]
    fn test_malformed_tokens() {
        let malformed_tokens = [
            "",                          // Empty token
            "not.a.jwt.token",           // Too many segments
            "missing.segments",          // Too few segments
            "invalid base64.parts.here", // Invalid base64
            "eyJhbGciOiJIUzI1NiJ9",      // Header only
        ];

        for token in &malformed_tokens {
            let result = validate_token(token, SECRET);
            assert!(result.is_err(), "Token '{}' should be rejected", token);
            match result {
                Err(JwtError::InvalidToken) => {}
                _ => panic!("Expected InvalidToken error for '{}'", token),
            }
        }
    }

    #[test]
    fn test_expired_token_rejection() {
        let user_id = Uuid::new_v4();

        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: (now.timestamp() - 7200) as usize,
            exp: (now.timestamp() - 3600) as usize, // Expired an hour ago
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let result = validate_token(&token, SECRET);
        match result {
            Err(JwtError::InvalidToken) => {}
            _ => panic!("Expected InvalidToken error for expired token"),
        }
    }

    #[test]
    fn test_claims_issued_and_expiry_times() {
        let user_id = Uuid::new_v4();

        let now = Utc::now().timestamp() as usize;
        let token = generate_token(&user_id, SECRET).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();

        assert!(
            claims.iat <= now + 1 && claims.iat >= now - 1,
            "Issued at time should be close to current time"
        );

        let expected_expiry = now + (24 * 60 * 60);
        assert!(
            claims.exp <= expected_expiry + 5 && claims.exp >= expected_expiry - 5,
            "Expiry should be approximately 24 hours from now"
        );
    }

    #[test]
    fn test_uuid_conversion_in_claims() {
        let user_id = Uuid::new_v4();
        let token = generate_token(&user_id, SECRET).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id.to_string());

        let nil_uuid = Uuid::nil();
        let token = generate_token(&nil_uuid, SECRET).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, nil_uuid.to_string());
    }

    #[test]
    fn test_jwt_error_conversion() {
        assert_eq!(
            StatusCode::from(JwtError::MissingSecret),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StatusCode::from(JwtError::TokenCreation),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StatusCode::from(JwtError::InvalidToken),
            StatusCode::UNAUTHORIZED
        );
    }
}
