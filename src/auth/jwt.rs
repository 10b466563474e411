//! JWT Token Handler
//! Issue and validate HS256 access tokens carrying principal claims.

use crate::auth::models::{Claims, RoleMarker};
use crate::clock::{Clock, SystemClock};
use anyhow::{bail, Context, Result};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tracing::debug;

/// Tokens live for eight hours and cannot be revoked before that.
pub const TOKEN_LIFETIME_HOURS: i64 = 8;

/// JWT Handler for token operations
pub struct JwtHandler {
    secret: String,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtHandler {
    /// Create a new JWT handler with secret key
    pub fn new(secret: String) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: String, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret,
            lifetime: Duration::hours(TOKEN_LIFETIME_HOURS),
            clock,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.secret.is_empty()
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime.num_seconds()
    }

    /// Sign a token for a principal. The role marker is only embedded when
    /// one is given; an empty cargo counts as none.
    pub fn generate_token(
        &self,
        id: i64,
        email: &str,
        role: Option<&RoleMarker>,
    ) -> Result<(String, i64)> {
        if !self.is_configured() {
            bail!("JWT secret is not configured");
        }

        let now = self.clock.now();
        let expiration = now
            .checked_add_signed(self.lifetime)
            .context("Invalid timestamp")?;

        let (cargo, is_admin) = match role {
            Some(RoleMarker::Cargo(c)) if !c.trim().is_empty() => (Some(c.clone()), None),
            Some(RoleMarker::Admin(flag)) => (None, Some(*flag)),
            _ => (None, None),
        };

        let claims = Claims {
            id,
            email: email.to_string(),
            cargo,
            is_admin,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        debug!(
            "Generating JWT for {} ({}), expires in {}h",
            email,
            id,
            self.lifetime.num_hours()
        );

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate JWT")?;

        Ok((token, self.lifetime_secs()))
    }

    /// Validate a JWT token and extract claims.
    ///
    /// Expiry is checked against this handler's clock with no leeway:
    /// a token is rejected from the second its `exp` is reached.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        if !self.is_configured() {
            bail!("JWT secret is not configured");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .context("Invalid token")?;

        let claims = decoded.claims;
        if claims.exp <= self.clock.now().timestamp() {
            bail!("Token expired");
        }

        debug!("Validated JWT for {}", claims.email);

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn handler_at(secret: &str) -> (JwtHandler, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let handler = JwtHandler::with_clock(secret.to_string(), clock.clone());
        (handler, clock)
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let (handler, _clock) = handler_at("test-secret-key-12345");

        let (token, expires_in) = handler.generate_token(42, "a@x.com", None).unwrap();
        assert!(!token.is_empty());
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(expires_in, 8 * 3600);

        let claims = handler.validate_token(&token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.cargo, None);
        assert_eq!(claims.is_admin, None);
        assert_eq!(claims.exp - claims.iat, 8 * 3600);
    }

    #[test]
    fn test_role_markers_round_trip() {
        let (handler, _clock) = handler_at("test-secret-key-12345");

        let cargo = RoleMarker::Cargo("suporte".to_string());
        let (token, _) = handler.generate_token(3, "f@x.com", Some(&cargo)).unwrap();
        let claims = handler.validate_token(&token).unwrap();
        assert_eq!(claims.cargo.as_deref(), Some("suporte"));
        assert_eq!(claims.is_admin, None);

        let admin = RoleMarker::Admin(true);
        let (token, _) = handler.generate_token(1, "root@x.com", Some(&admin)).unwrap();
        let claims = handler.validate_token(&token).unwrap();
        assert_eq!(claims.is_admin, Some(true));
        assert_eq!(claims.cargo, None);
    }

    #[test]
    fn test_empty_cargo_is_omitted() {
        let (handler, _clock) = handler_at("test-secret-key-12345");
        let blank = RoleMarker::Cargo(String::new());
        let (token, _) = handler.generate_token(5, "b@x.com", Some(&blank)).unwrap();
        let claims = handler.validate_token(&token).unwrap();
        assert!(claims.is_plain_user());
    }

    #[test]
    fn test_token_expires_after_eight_hours() {
        let (handler, clock) = handler_at("test-secret-key-12345");
        let (token, _) = handler.generate_token(42, "a@x.com", None).unwrap();

        clock.advance(Duration::hours(8) - Duration::seconds(1));
        assert!(handler.validate_token(&token).is_ok());

        clock.advance(Duration::seconds(1));
        assert!(handler.validate_token(&token).is_err());
    }

    #[test]
    fn test_invalid_token_rejected() {
        let (handler, _clock) = handler_at("test-secret-key-12345");
        assert!(handler.validate_token("invalid.token.here").is_err());
        assert!(handler.validate_token("").is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let (handler, _clock) = handler_at("test-secret-key-12345");
        let (token, _) = handler.generate_token(42, "a@x.com", None).unwrap();

        // Swap the payload for one claiming admin, keep the original signature.
        let mut parts: Vec<&str> = token.split('.').collect();
        let (forged, _) = handler
            .generate_token(42, "a@x.com", Some(&RoleMarker::Admin(true)))
            .unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_payload;
        let tampered = parts.join(".");

        assert!(handler.validate_token(&tampered).is_err());
    }

    #[test]
    fn test_different_secrets_reject() {
        let (handler1, _) = handler_at("secret1");
        let (handler2, _) = handler_at("secret2");

        let (token, _) = handler1.generate_token(1, "a@x.com", None).unwrap();
        assert!(handler2.validate_token(&token).is_err());
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let (handler, _) = handler_at("");
        assert!(!handler.is_configured());
        assert!(handler.generate_token(1, "a@x.com", None).is_err());
        assert!(handler.validate_token("a.b.c").is_err());
    }
}
