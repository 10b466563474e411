//! Registration and login, one implementation for every principal kind.

use crate::auth::{
    jwt::JwtHandler,
    models::{CredentialRecord, NewCredential, PrincipalKind, Registration},
    password::PasswordHasher,
    store::{CredentialStore, DuplicateEmail},
};
use crate::error::ApiError;
use crate::validation::normalize_email;
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a successful registration or login.
#[derive(Debug)]
pub struct Authenticated {
    pub principal: CredentialRecord,
    pub token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    jwt: Arc<JwtHandler>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        jwt: Arc<JwtHandler>,
    ) -> Self {
        Self { store, hasher, jwt }
    }

    pub fn jwt(&self) -> &Arc<JwtHandler> {
        &self.jwt
    }

    /// Existence check, hash, insert. Does not issue a token.
    ///
    /// A taken email is rejected before the password is hashed.
    pub async fn create_principal(
        &self,
        kind: PrincipalKind,
        registration: Registration,
    ) -> Result<CredentialRecord, ApiError> {
        let email = normalize_email(&registration.email);

        if self.store.count_by_email(kind, &email)? > 0 {
            warn!("Registration rejected, {} email already in use", kind.as_str());
            return Err(email_taken());
        }

        let password_hash = self.hash_password(registration.password).await?;

        let new = NewCredential {
            name: registration.name.trim().to_string(),
            email,
            password_hash,
            role: registration.role,
            phone: registration
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        };

        self.store.insert(kind, &new).map_err(|e| {
            if e.downcast_ref::<DuplicateEmail>().is_some() {
                email_taken()
            } else {
                ApiError::Internal(e)
            }
        })
    }

    /// Create the principal and hand back a token for it.
    pub async fn register(
        &self,
        kind: PrincipalKind,
        registration: Registration,
    ) -> Result<Authenticated, ApiError> {
        // Fail before persisting anything if no token could be signed anyway.
        if !self.jwt.is_configured() {
            return Err(ApiError::Internal(anyhow::anyhow!(
                "JWT secret is not configured"
            )));
        }
        let principal = self.create_principal(kind, registration).await?;
        self.issue_for(principal)
    }

    /// Unknown email and wrong password end in the same error, after the
    /// same amount of hashing work.
    pub async fn login(
        &self,
        kind: PrincipalKind,
        email: &str,
        password: &str,
    ) -> Result<Authenticated, ApiError> {
        let email = normalize_email(email);
        info!("🔐 Login attempt ({}): {}", kind.as_str(), email);

        let principal = self.store.find_by_email(kind, &email)?;

        let digest = match &principal {
            Some(p) => p.password_hash.clone(),
            None => self.hasher.decoy_digest().to_string(),
        };
        let valid = self.verify_password(digest, password.to_string()).await?;

        match principal {
            Some(principal) if valid => {
                info!("✅ Login successful: {} ({})", principal.email, kind.as_str());
                self.issue_for(principal)
            }
            _ => {
                warn!("❌ Failed login attempt ({}): {}", kind.as_str(), email);
                Err(ApiError::InvalidCredentials)
            }
        }
    }

    /// Re-check a principal's password, for sensitive account changes.
    pub async fn confirm_password(
        &self,
        kind: PrincipalKind,
        id: i64,
        password: &str,
    ) -> Result<CredentialRecord, ApiError> {
        let principal = self
            .store
            .find_by_id(kind, id)?
            .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

        let valid = self
            .verify_password(principal.password_hash.clone(), password.to_string())
            .await?;
        if !valid {
            return Err(ApiError::InvalidCredentials);
        }
        Ok(principal)
    }

    pub fn issue_for(&self, principal: CredentialRecord) -> Result<Authenticated, ApiError> {
        let (token, expires_in) =
            self.jwt
                .generate_token(principal.id, &principal.email, principal.role.as_ref())?;
        Ok(Authenticated {
            principal,
            token,
            expires_in,
        })
    }

    async fn hash_password(&self, password: String) -> Result<String, ApiError> {
        let hasher = self.hasher.clone();
        let digest = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("Password hashing task failed")??;
        Ok(digest)
    }

    async fn verify_password(&self, digest: String, password: String) -> Result<bool, ApiError> {
        let hasher = self.hasher.clone();
        let valid = tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .context("Password verification task failed")?;
        Ok(valid)
    }
}

fn email_taken() -> ApiError {
    ApiError::Conflict("Email already registered".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::RoleMarker;
    use crate::auth::password::BcryptHasher;
    use crate::store::Database;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts hashing work so tests can assert none happened.
    struct CountingHasher {
        inner: BcryptHasher,
        hashes: AtomicUsize,
        verifies: AtomicUsize,
    }

    impl CountingHasher {
        fn new() -> Self {
            Self {
                inner: BcryptHasher::new(4).unwrap(),
                hashes: AtomicUsize::new(0),
                verifies: AtomicUsize::new(0),
            }
        }
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, plaintext: &str) -> anyhow::Result<String> {
            self.hashes.fetch_add(1, Ordering::SeqCst);
            self.inner.hash(plaintext)
        }

        fn verify(&self, digest: &str, plaintext: &str) -> bool {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            self.inner.verify(digest, plaintext)
        }

        fn decoy_digest(&self) -> &str {
            self.inner.decoy_digest()
        }
    }

    fn service() -> (AuthService, Arc<CountingHasher>) {
        let db = Arc::new(Database::in_memory().unwrap());
        let hasher = Arc::new(CountingHasher::new());
        let jwt = Arc::new(JwtHandler::new("flows-test-secret".to_string()));
        (AuthService::new(db, hasher.clone(), jwt), hasher)
    }

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            name: "Ana".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: None,
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_register_issues_token_for_new_principal() {
        let (auth, _) = service();
        let out = auth
            .register(PrincipalKind::User, registration("A@X.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(out.principal.email, "a@x.com");
        assert_ne!(out.principal.password_hash, "secret1");
        let claims = auth.jwt().validate_token(&out.token).unwrap();
        assert_eq!(claims.id, out.principal.id);
        assert!(claims.is_plain_user());
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected_before_hashing() {
        let (auth, hasher) = service();
        auth.register(PrincipalKind::User, registration("a@x.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(hasher.hashes.load(Ordering::SeqCst), 1);

        let err = auth
            .register(PrincipalKind::User, registration("a@x.com", "another1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(hasher.hashes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (auth, hasher) = service();
        auth.register(PrincipalKind::User, registration("a@x.com", "secret1"))
            .await
            .unwrap();

        let before = hasher.verifies.load(Ordering::SeqCst);
        let wrong_password = auth
            .login(PrincipalKind::User, "a@x.com", "secret2")
            .await
            .unwrap_err();
        let unknown_email = auth
            .login(PrincipalKind::User, "ghost@x.com", "secret1")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ApiError::InvalidCredentials));
        assert!(matches!(unknown_email, ApiError::InvalidCredentials));
        // Both paths did exactly one verification.
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), before + 2);
    }

    #[tokio::test]
    async fn test_login_is_per_principal_table() {
        let (auth, _) = service();
        let mut employee = registration("f@x.com", "secret1");
        employee.role = Some(RoleMarker::Cargo("vendas".to_string()));
        auth.register(PrincipalKind::Employee, employee).await.unwrap();

        let ok = auth
            .login(PrincipalKind::Employee, "f@x.com", "secret1")
            .await
            .unwrap();
        let claims = auth.jwt().validate_token(&ok.token).unwrap();
        assert_eq!(claims.cargo.as_deref(), Some("vendas"));

        // Not a user account.
        assert!(auth
            .login(PrincipalKind::User, "f@x.com", "secret1")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_confirm_password() {
        let (auth, _) = service();
        let out = auth
            .register(PrincipalKind::User, registration("a@x.com", "secret1"))
            .await
            .unwrap();
        let id = out.principal.id;

        assert!(auth
            .confirm_password(PrincipalKind::User, id, "secret1")
            .await
            .is_ok());
        assert!(matches!(
            auth.confirm_password(PrincipalKind::User, id, "nope123").await,
            Err(ApiError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.confirm_password(PrincipalKind::User, id + 100, "secret1").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_secret_is_internal_error() {
        let db = Arc::new(Database::in_memory().unwrap());
        let hasher = Arc::new(BcryptHasher::new(4).unwrap());
        let jwt = Arc::new(JwtHandler::new(String::new()));
        let auth = AuthService::new(db, hasher, jwt);

        let err = auth
            .register(PrincipalKind::User, registration("a@x.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
