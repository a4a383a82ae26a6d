// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT access/refresh token issuing and verification.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of token, carried in the `token_type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub token_type: TokenType,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Unique token ID
    pub jti: String,
}

impl Claims {
    /// User ID from the `sub` claim.
    pub fn user_id(&self) -> Option<u64> {
        self.sub.parse().ok()
    }
}

/// Access + refresh token pair returned at login.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

/// Token verification failures.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is invalid or expired")]
    Invalid,
    #[error("token has wrong type")]
    WrongType,
    #[error("failed to issue token: {0}")]
    Issue(String),
}

/// Signs and verifies HS256 tokens.
#[derive(Clone)]
pub struct TokenService {
    signing_key: Vec<u8>,
    access_lifetime_secs: u64,
    refresh_lifetime_secs: u64,
}

impl TokenService {
    pub fn new(signing_key: &[u8], access_lifetime_secs: u64, refresh_lifetime_secs: u64) -> Self {
        Self {
            signing_key: signing_key.to_vec(),
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    /// Issue a fresh access + refresh pair for a user.
    pub fn issue_pair(&self, user_id: u64) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            refresh: self.issue(user_id, TokenType::Refresh)?,
            access: self.issue(user_id, TokenType::Access)?,
        })
    }

    /// Issue a single token of the given type.
    pub fn issue(&self, user_id: u64, token_type: TokenType) -> Result<String, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TokenError::Issue(e.to_string()))?
            .as_secs() as usize;

        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime_secs,
            TokenType::Refresh => self.refresh_lifetime_secs,
        } as usize;

        let mut jti = [0u8; 16];
        SystemRandom::new()
            .fill(&mut jti)
            .map_err(|_| TokenError::Issue("failed to generate token id".to_string()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            token_type,
            iat: now,
            exp: now + lifetime,
            jti: hex::encode(jti),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .map_err(|e| TokenError::Issue(e.to_string()))
    }

    /// Verify signature and expiry of a token of any type.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let key = DecodingKey::from_secret(&self.signing_key);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }

    /// Verify a token and require the given type.
    pub fn verify_type(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test_signing_key_32_bytes_long!!", 3 * 86400, 14 * 86400)
    }

    #[test]
    fn test_pair_roundtrip() {
        let tokens = service();
        let pair = tokens.issue_pair(42).unwrap();

        let access = tokens.verify_type(&pair.access, TokenType::Access).unwrap();
        assert_eq!(access.user_id(), Some(42));
        assert_eq!(access.exp - access.iat, 3 * 86400);

        let refresh = tokens.verify_type(&pair.refresh, TokenType::Refresh).unwrap();
        assert_eq!(refresh.exp - refresh.iat, 14 * 86400);
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn test_wrong_type_rejected() {
        let tokens = service();
        let pair = tokens.issue_pair(42).unwrap();
        assert!(matches!(
            tokens.verify_type(&pair.refresh, TokenType::Access),
            Err(TokenError::WrongType)
        ));
        // Plain verification accepts either type
        assert!(tokens.verify(&pair.refresh).is_ok());
    }

    #[test]
    fn test_other_key_rejected() {
        let pair = service().issue_pair(42).unwrap();
        let other = TokenService::new(b"another_key_that_is_32_bytes_ok!", 60, 60);
        assert!(matches!(other.verify(&pair.access), Err(TokenError::Invalid)));
        assert!(matches!(other.verify("not.a.jwt"), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_expired_rejected() {
        let tokens = TokenService::new(b"test_signing_key_32_bytes_long!!", 0, 0);
        let token = tokens.issue(42, TokenType::Access).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid)));
    }
}
