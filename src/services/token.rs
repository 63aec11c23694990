use crate::config::AuthConfig;
use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is invalid or expired")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("expected a {expected:?} token, got {found:?}")]
    WrongType {
        expected: TokenType,
        found: TokenType,
    },
    #[error("token signing failed")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Signs and verifies HS256 access/refresh tokens.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(
        secret: &str,
        access_ttl: std::time::Duration,
        refresh_ttl: std::time::Duration,
    ) -> Result<Self> {
        if secret.is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl: Duration::from_std(access_ttl)?,
            refresh_ttl: Duration::from_std(refresh_ttl)?,
        })
    }

    pub fn from_config(auth: &AuthConfig) -> Result<Self> {
        Self::new(&auth.jwt_secret, auth.access_ttl()?, auth.refresh_ttl()?)
    }

    pub fn issue(&self, user_id: i64, token_type: TokenType) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            token_type,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            user_id,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    pub fn issue_pair(&self, user_id: i64) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(user_id, TokenType::Access)?,
            refresh: self.issue(user_id, TokenType::Refresh)?,
        })
    }

    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let data =
            decode::<Claims>(token, &self.decoding, &self.validation).map_err(TokenError::Invalid)?;

        if data.claims.token_type != expected {
            return Err(TokenError::WrongType {
                expected,
                found: data.claims.token_type,
            });
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    const SECRET: &str = "unit-test-secret";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, StdDuration::from_secs(300), StdDuration::from_secs(86_400))
            .unwrap()
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = TokenIssuer::new("", StdDuration::from_secs(1), StdDuration::from_secs(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_pair_round_trip() {
        let issuer = issuer();
        let pair = issuer.issue_pair(42).unwrap();

        let access = issuer.verify(&pair.access, TokenType::Access).unwrap();
        assert_eq!(access.user_id, 42);
        assert_eq!(access.exp - access.iat, 300);

        let refresh = issuer.verify(&pair.refresh, TokenType::Refresh).unwrap();
        assert_eq!(refresh.user_id, 42);
        assert_eq!(refresh.exp - refresh.iat, 86_400);
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn test_token_type_is_enforced() {
        let issuer = issuer();
        let pair = issuer.issue_pair(1).unwrap();

        assert!(matches!(
            issuer.verify(&pair.refresh, TokenType::Access),
            Err(TokenError::WrongType { .. })
        ));
        assert!(matches!(
            issuer.verify(&pair.access, TokenType::Refresh),
            Err(TokenError::WrongType { .. })
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer();
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            token_type: TokenType::Access,
            exp: (past + Duration::minutes(5)).timestamp(),
            iat: past.timestamp(),
            jti: "expired".to_string(),
            user_id: 7,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            issuer.verify(&token, TokenType::Access),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = TokenIssuer::new(
            "another-secret",
            StdDuration::from_secs(300),
            StdDuration::from_secs(300),
        )
        .unwrap();
        let token = other.issue(1, TokenType::Access).unwrap();

        assert!(issuer().verify(&token, TokenType::Access).is_err());
        assert!(issuer().verify("not-a-jwt", TokenType::Access).is_err());
    }
}
