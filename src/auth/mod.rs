//! Authentication Module
//! Password hashing, JWT issuance/validation, and role-gating middleware.

pub mod api;
pub mod flows;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod store;

pub use flows::AuthService;
pub use jwt::JwtHandler;
pub use middleware::{auth_middleware, optional_auth_middleware, require_role, RoleRequirement};
pub use password::{BcryptHasher, PasswordHasher};
pub use store::CredentialStore;
