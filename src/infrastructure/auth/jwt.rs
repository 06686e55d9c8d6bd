//! JWT issuance and verification

use std::fmt::Debug;
use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

use crate::domain::role::Role;
use crate::domain::DomainError;

/// Arbitrary token claims
pub type Claims = Map<String, Value>;

pub const ROLE_CLAIM: &str = "role";
pub const EXPIRY_CLAIM: &str = "exp";

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC secret
    pub secret: String,
    /// Algorithm name, one of HS256, HS384, HS512
    pub algorithm: String,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: algorithm.into(),
        }
    }
}

/// Signs and verifies role-carrying tokens
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Result<Self, DomainError> {
        let algorithm = Algorithm::from_str(&config.algorithm).map_err(|_| {
            DomainError::configuration(format!("Unknown JWT algorithm: {}", config.algorithm))
        })?;

        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(DomainError::configuration(format!(
                "Only HMAC algorithms are supported, got {}",
                config.algorithm
            )));
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        })
    }

    /// Sign `claims` plus the role and an absolute expiry `validity` from now
    pub fn encode(
        &self,
        mut claims: Claims,
        role: Option<Role>,
        validity: Duration,
    ) -> Result<String, DomainError> {
        let role = match role {
            Some(role) => Value::from(u8::from(role)),
            None => Value::Null,
        };
        claims.insert(ROLE_CLAIM.to_string(), role);
        claims.insert(
            EXPIRY_CLAIM.to_string(),
            Value::from((Utc::now() + validity).timestamp()),
        );

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to generate JWT: {}", e)))
    }

    /// Verify signature and expiry, then the role when one is required
    pub fn decode(&self, token: &str, required_role: Option<Role>) -> Result<Claims, DomainError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&[EXPIRY_CLAIM]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => DomainError::ExpiredToken,
                _ => DomainError::InvalidToken,
            })?
            .claims;

        if let Some(required) = required_role {
            let role = claims
                .get(ROLE_CLAIM)
                .and_then(Value::as_u64)
                .and_then(|code| u8::try_from(code).ok())
                .and_then(|code| Role::try_from(code).ok());

            if role != Some(required) {
                return Err(DomainError::unauthorized("Unauthorized"));
            }
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&TokenConfig::new(secret, "HS256")).unwrap()
    }

    fn claims() -> Claims {
        match json!({"sub": "ann"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_round_trip() {
        let tokens = service("secret");
        let token = tokens
            .encode(claims(), Some(Role::User), Duration::minutes(5))
            .unwrap();

        let decoded = tokens.decode(&token, Some(Role::User)).unwrap();
        assert_eq!(decoded["sub"], "ann");
        assert_eq!(decoded[ROLE_CLAIM], 3);
        assert!(decoded[EXPIRY_CLAIM].as_i64().unwrap() > Utc::now().timestamp());
    }

    #[test]
    fn test_no_required_role() {
        let tokens = service("secret");
        let token = tokens.encode(claims(), None, Duration::minutes(5)).unwrap();

        let decoded = tokens.decode(&token, None).unwrap();
        assert!(decoded[ROLE_CLAIM].is_null());
    }

    #[test]
    fn test_expired_token() {
        let tokens = service("secret");
        let token = tokens
            .encode(claims(), Some(Role::User), Duration::seconds(-10))
            .unwrap();

        let result = tokens.decode(&token, Some(Role::User));
        assert!(matches!(result, Err(DomainError::ExpiredToken)));
    }

    #[test]
    fn test_tampered_signature() {
        let token = service("secret")
            .encode(claims(), Some(Role::User), Duration::minutes(5))
            .unwrap();

        let result = service("other-secret").decode(&token, Some(Role::User));
        assert!(matches!(result, Err(DomainError::InvalidToken)));

        let result = service("secret").decode("not.a.token", None);
        assert!(matches!(result, Err(DomainError::InvalidToken)));
    }

    #[test]
    fn test_role_mismatch() {
        let tokens = service("secret");
        let token = tokens
            .encode(claims(), Some(Role::User), Duration::minutes(5))
            .unwrap();

        let result = tokens.decode(&token, Some(Role::Admin));
        assert!(matches!(result, Err(DomainError::Unauthorized { .. })));
    }

    #[test]
    fn test_unsupported_algorithm() {
        let result = TokenService::new(&TokenConfig::new("secret", "RS256"));
        assert!(matches!(result, Err(DomainError::Configuration { .. })));

        let result = TokenService::new(&TokenConfig::new("secret", "nope"));
        assert!(result.is_err());
    }
}
