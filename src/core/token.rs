//! Access tokens.
//!
//! HS256 JWTs whose `sub` claim is the user id. Tokens are stateless, so
//! logging out is a client-side operation.

use crate::errors::{Error, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by every access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// User e-mail
    pub email: String,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Unique token id
    pub jti: String,
}

/// A freshly issued token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// Encoded JWT
    pub access_token: String,
    /// Always `"bearer"`
    pub token_type: &'static str,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Issues and verifies access tokens.
pub struct TokenIssuer {
    secret: SecretString,
    ttl: Duration,
}

impl TokenIssuer {
    /// Creates an issuer signing with `secret`; tokens live `ttl_hours`.
    #[must_use]
    pub fn new(secret: SecretString, ttl_hours: i64) -> Self {
        Self {
            secret,
            ttl: Duration::hours(ttl_hours.max(1)),
        }
    }

    /// Issues a token for the given user.
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<IssuedToken> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )?;

        Ok(IssuedToken {
            access_token,
            token_type: "bearer",
            expires_in: self.ttl.num_seconds(),
        })
    }

    /// Verifies a token and returns the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<Uuid> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| Error::unauthorized(format!("Invalid token: {e}")))?;

        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| Error::unauthorized("Invalid user id in token"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(SecretString::new(secret.into()), 24)
    }

    #[test]
    fn test_issue_then_verify() -> Result<()> {
        let issuer = issuer("test-secret");
        let user_id = Uuid::new_v4();
        let token = issuer.issue(user_id, "ada@example.com")?;

        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 24 * 3600);
        assert_eq!(issuer.verify(&token.access_token)?, user_id);
        Ok(())
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() -> Result<()> {
        let token = issuer("one").issue(Uuid::new_v4(), "a@b.c")?;
        let result = issuer("two").verify(&token.access_token);
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        Ok(())
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let result = issuer("secret").verify("not.a.jwt");
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
    }
}
