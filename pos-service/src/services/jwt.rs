use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pos_core::error::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::User;

/// JWT service for token generation and validation
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
}

/// Claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    pub email: String,
    /// Account role
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

impl AccessTokenClaims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Malformed token subject")))
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == "admin" {
            Ok(())
        } else {
            Err(AppError::Forbidden(anyhow::anyhow!(
                "Administrator access required"
            )))
        }
    }
}

/// Token response returned to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl JwtService {
    /// Create a new JWT service from a shared HMAC secret
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
        }
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<TokenResponse, AppError> {
        let now = Utc::now();
        let expiry = Duration::minutes(self.access_token_expiry_minutes);
        let exp = now + expiry;

        let claims = AccessTokenClaims {
            sub: user.user_id.to_string(),
            email: user.email.clone(),
            role: user.role.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode token: {}", e)))?;

        Ok(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: expiry.num_seconds(),
        })
    }

    /// Validate an access token and return its claims
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry_minutes: 15,
        })
    }

    fn test_user() -> User {
        User {
            user_id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: "admin".to_string(),
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let service = test_service();
        let user = test_user();

        let token = service.generate_access_token(&user).unwrap();
        let claims = service.validate_access_token(&token.access_token).unwrap();

        assert_eq!(claims.sub, user.user_id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.user_id().unwrap(), user.user_id);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = test_service();
        let token = service.generate_access_token(&test_user()).unwrap();

        let mut tampered = token.access_token.clone();
        tampered.push('x');
        assert!(service.validate_access_token(&tampered).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = test_service()
            .generate_access_token(&test_user())
            .unwrap();

        let other = JwtService::new(&JwtConfig {
            secret: "other-secret".to_string(),
            access_token_expiry_minutes: 15,
        });
        assert!(other.validate_access_token(&token.access_token).is_err());
    }

    #[test]
    fn employee_role_is_not_admin() {
        let claims = AccessTokenClaims {
            sub: Uuid::new_v4().to_string(),
            email: "e@example.com".to_string(),
            role: "employee".to_string(),
            exp: 0,
            iat: 0,
            jti: "jti".to_string(),
        };
        assert!(claims.require_admin().is_err());
    }
}
