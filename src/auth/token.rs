// JWT issuing and validation

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Identity carried in a token
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSubject {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub customer_id: Option<i32>,
    pub dealer_id: Option<i32>,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer_id: Option<i32>,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
    /// Unique per token so two tokens minted in the same second differ
    pub jti: String,
}

impl Claims {
    pub fn subject(&self) -> TokenSubject {
        TokenSubject {
            user_id: self.sub,
            username: self.username.clone(),
            role: self.role,
            customer_id: self.customer_id,
            dealer_id: self.dealer_id,
        }
    }
}

pub struct TokenService {
    secret: String,
    access_token_duration: i64,
    refresh_token_duration: i64,
}

impl TokenService {
    /// Access tokens last 15 minutes, refresh tokens 7 days
    pub fn new(secret: String) -> Self {
        Self::with_durations(secret, 900, 604_800)
    }

    pub fn with_durations(secret: String, access_secs: i64, refresh_secs: i64) -> Self {
        Self {
            secret,
            access_token_duration: access_secs,
            refresh_token_duration: refresh_secs,
        }
    }

    pub fn access_token_duration(&self) -> i64 {
        self.access_token_duration
    }

    pub fn refresh_token_duration(&self) -> i64 {
        self.refresh_token_duration
    }

    pub fn generate_access_token(&self, subject: &TokenSubject) -> Result<String, AuthError> {
        self.generate(subject, TokenKind::Access, self.access_token_duration)
    }

    pub fn generate_refresh_token(&self, subject: &TokenSubject) -> Result<String, AuthError> {
        self.generate(subject, TokenKind::Refresh, self.refresh_token_duration)
    }

    pub fn generate_token_pair(&self, subject: &TokenSubject) -> Result<(String, String), AuthError> {
        Ok((
            self.generate_access_token(subject)?,
            self.generate_refresh_token(subject)?,
        ))
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate(token, TokenKind::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate(token, TokenKind::Refresh)
    }

    fn generate(&self, subject: &TokenSubject, kind: TokenKind, ttl: i64) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.user_id,
            username: subject.username.clone(),
            role: subject.role,
            customer_id: subject.customer_id,
            dealer_id: subject.dealer_id,
            kind,
            iat: now,
            exp: now + ttl,
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })?;

        if claims.kind != expected {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_token_service() -> TokenService {
        TokenService::new("test_secret_key_for_testing_purposes".to_string())
    }

    fn dealer(user_id: i32) -> TokenSubject {
        TokenSubject {
            user_id,
            username: "dealer".to_string(),
            role: Role::Dealer,
            customer_id: None,
            dealer_id: Some(7),
        }
    }

    #[test]
    fn test_access_token_expires_in_15_minutes() {
        let service = test_token_service();
        let token = service.generate_access_token(&dealer(1)).unwrap();
        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_expires_in_7_days() {
        let service = test_token_service();
        let token = service.generate_refresh_token(&dealer(1)).unwrap();
        let claims = service.validate_refresh_token(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 604_800);
    }

    #[test]
    fn test_claims_carry_profile_ids() {
        let service = test_token_service();
        let token = service.generate_access_token(&dealer(5)).unwrap();
        let subject = service.validate_access_token(&token).unwrap().subject();
        assert_eq!(subject, dealer(5));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let service = test_token_service();
        let (access, refresh) = service.generate_token_pair(&dealer(1)).unwrap();
        assert!(matches!(
            service.validate_access_token(&refresh),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            service.validate_refresh_token(&access),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_tokens_minted_together_differ() {
        let service = test_token_service();
        let a = service.generate_refresh_token(&dealer(1)).unwrap();
        let b = service.generate_refresh_token(&dealer(1)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_token_is_reported() {
        let service = TokenService::with_durations("secret".to_string(), -120, -120);
        let token = service.generate_access_token(&dealer(1)).unwrap();
        assert!(matches!(
            service.validate_access_token(&token),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[test]
    fn test_signature_is_verified() {
        let a = TokenService::new("secret1".to_string());
        let b = TokenService::new("secret2".to_string());
        let token = a.generate_access_token(&dealer(1)).unwrap();
        assert!(a.validate_access_token(&token).is_ok());
        assert!(b.validate_access_token(&token).is_err());
    }

    proptest! {
        #[test]
        fn prop_subject_survives_round_trip(
            user_id in 1i32..1_000_000,
            username in "[a-z]{3,20}",
            customer_id in proptest::option::of(1i32..10_000),
        ) {
            let service = test_token_service();
            let subject = TokenSubject {
                user_id,
                username,
                role: Role::Customer,
                customer_id,
                dealer_id: None,
            };
            let token = service.generate_access_token(&subject)?;
            let claims = service.validate_access_token(&token)?;
            prop_assert_eq!(claims.subject(), subject);
        }

        #[test]
        fn prop_malformed_tokens_rejected(malformed in "[a-zA-Z0-9]{10,50}") {
            let service = test_token_service();
            prop_assert!(service.validate_access_token(&malformed).is_err());
        }
    }
}
