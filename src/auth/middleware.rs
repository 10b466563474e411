//! Authentication Middleware
//! Bearer-token authentication gate and role-based authorization gate.

use crate::auth::{
    jwt::JwtHandler,
    models::{Claims, Role},
};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Auth middleware that validates JWT tokens.
///
/// On success the decoded [`Claims`] are inserted into the request
/// extensions; otherwise the request ends here with 401.
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;

    let claims = jwt_handler.validate_token(&token).map_err(|e| {
        debug!("Rejected bearer token: {:#}", e);
        AuthError::InvalidToken
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Optional auth middleware - allows requests without token but adds claims if present
pub async fn optional_auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers()) {
        if let Ok(claims) = jwt_handler.validate_token(&token) {
            req.extensions_mut().insert(claims);
        }
    }

    next.run(req).await
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .filter(|token| !token.is_empty())
}

/// Extract claims from request (use after auth middleware)
pub fn extract_claims(req: &Request) -> Option<&Claims> {
    req.extensions().get::<Claims>()
}

/// Role a route demands, checked against the claims attached by
/// [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    /// `is_admin` present and true.
    Administrator,
    /// Any non-empty `cargo`. Administrators also qualify.
    Employee,
    /// A specific `cargo`, compared case-insensitively. Administrators also qualify.
    EmployeeWithCargo(String),
}

impl RoleRequirement {
    pub fn permits(&self, claims: &Claims) -> bool {
        let role = claims.role();
        match self {
            RoleRequirement::Administrator => role == Role::Administrator,
            RoleRequirement::Employee => {
                matches!(role, Role::Administrator | Role::Employee(_))
            }
            RoleRequirement::EmployeeWithCargo(required) => match role {
                Role::Administrator => true,
                Role::Employee(cargo) => cargo.trim().eq_ignore_ascii_case(required.trim()),
                Role::User => false,
            },
        }
    }
}

/// Authorization gate. Must be layered inside [`auth_middleware`].
pub async fn require_role(
    State(required): State<RoleRequirement>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = extract_claims(&req).ok_or(AuthError::MissingToken)?;

    if !required.permits(claims) {
        warn!(
            principal = claims.id,
            email = %claims.email,
            required = ?required,
            "Forbidden: missing required role"
        );
        return Err(AuthError::Forbidden);
    }

    Ok(next.run(req).await)
}

/// Auth error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Missing, malformed, forged and expired tokens all look the same.
        let (status, message) = match self {
            AuthError::MissingToken | AuthError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Invalid or missing token")
            }
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
