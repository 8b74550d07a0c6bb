use crate::config::SessionConfig;
use crate::models::Claims;
use anyhow::{anyhow, Result};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use uuid::Uuid;

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "session";

pub struct SessionAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiration_hours: i64,
}

impl SessionAuth {
    pub fn new(config: &SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let validation = Validation::default();

        Self {
            encoding_key,
            decoding_key,
            validation,
            expiration_hours: config.expiration_hours,
        }
    }

    /// Issue a signed session token bound to a user's id and role.
    pub fn issue_session(&self, user_id: i64, username: &str, role: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.expiration_hours * 3600);

        let claims = Claims {
            sub: username.to_string(),
            user_id,
            role: role.to_string(),
            exp,
            iat: now,
            jti: Uuid::new_v4(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| anyhow!("Session token generation failed: {}", e))
    }

    /// Validate and decode a session token.
    pub fn validate_session(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| anyhow!("Session validation failed: {}", e))
    }
}

/// Hash a password with argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow!("Password hashing failed: {}", e))
}

/// Verify a password against a stored argon2 hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    fn test_config() -> SessionConfig {
        SessionConfig {
            secret: "test_secret_key_minimum_32_chars_long_for_security".to_string(),
            expiration_hours: 24,
        }
    }

    #[test]
    fn test_session_issue_and_validation() {
        let auth = SessionAuth::new(&test_config());

        let token = auth
            .issue_session(7, "drsmith", "doctor")
            .expect("Session issue failed");
        let claims = auth.validate_session(&token).expect("Validation failed");

        assert_eq!(claims.sub, "drsmith");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.role, "doctor");
    }

    #[test]
    fn test_invalid_session_token() {
        let auth = SessionAuth::new(&test_config());
        let result = auth.validate_session("invalid.token.here");

        assert!(result.is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let auth = SessionAuth::new(&test_config());
        let other = SessionAuth::new(&SessionConfig {
            secret: "another_secret_key_minimum_32_chars_long_here".to_string(),
            expiration_hours: 24,
        });

        let token = other.issue_session(1, "admin", "admin").unwrap();
        assert!(auth.validate_session(&token).is_err());
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("s3cret-pass").expect("hashing failed");

        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong-pass", &hash));
    }

    #[test]
    fn test_verify_against_garbage_hash_fails_closed() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
