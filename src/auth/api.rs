//! Authentication API Endpoints
//! Registration, login, profile and principal management.

use crate::api::{AppState, JsonBody, QueryParams};
use crate::auth::{
    flows::{AuthService, Authenticated},
    models::{
        AuthResponse, Claims, CreateAdminRequest, LoginRequest, PrincipalKind, PrincipalResponse,
        ProfileResponse, RegisterEmployeeRequest, RegisterUserRequest, Registration, RoleMarker,
        UpdateEmailRequest, UpdatePhoneRequest,
    },
    store::{DuplicateEmail, EmployeeSummary, UserSummary},
};
use crate::error::ApiError;
use crate::store::Database;
use crate::validation::{
    normalize_email, optional_text, require_text, validate_email, validate_password,
};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

fn auth_response(out: Authenticated) -> AuthResponse {
    AuthResponse {
        principal: PrincipalResponse::from_record(&out.principal),
        token: out.token,
        expires_in: out.expires_in,
    }
}

fn validate_login(req: &LoginRequest) -> Result<(), ApiError> {
    validate_email("email", &req.email)?;
    validate_password("senha", &req.senha)
}

async fn login_as(
    state: &AppState,
    kind: PrincipalKind,
    req: LoginRequest,
) -> Result<Json<AuthResponse>, ApiError> {
    validate_login(&req)?;
    let out = state.auth.login(kind, &req.email, &req.senha).await?;
    Ok(Json(auth_response(out)))
}

/// User registration - POST /api/auth/registrar
pub async fn register_user(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<RegisterUserRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    validate_email("email", &req.email)?;
    validate_password("senha", &req.senha)?;
    optional_text("nome", req.nome.as_deref(), 100)?;
    optional_text("telefone", req.telefone.as_deref(), 20)?;

    let out = state
        .auth
        .register(
            PrincipalKind::User,
            Registration {
                name: req.nome.unwrap_or_default(),
                email: req.email,
                password: req.senha,
                role: None,
                phone: req.telefone,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(auth_response(out))))
}

/// User login - POST /api/auth/login
pub async fn login_user(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    login_as(&state, PrincipalKind::User, req).await
}

/// Employee registration - POST /api/auth/funcionarios/registrar (Admin only)
pub async fn register_employee(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<RegisterEmployeeRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    require_text("nome", &req.nome, 100)?;
    require_text("cargo", &req.cargo, 50)?;
    validate_email("email", &req.email)?;
    validate_password("senha", &req.senha)?;

    let out = state
        .auth
        .register(
            PrincipalKind::Employee,
            Registration {
                name: req.nome,
                email: req.email,
                password: req.senha,
                role: Some(RoleMarker::Cargo(req.cargo.trim().to_string())),
                phone: None,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(auth_response(out))))
}

/// Employee login - POST /api/auth/funcionarios/login
pub async fn login_employee(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    login_as(&state, PrincipalKind::Employee, req).await
}

/// Administrator login - POST /api/admin/login
pub async fn login_admin(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    login_as(&state, PrincipalKind::Administrator, req).await
}

/// Create administrator - POST /api/admin/administradores (Admin only)
///
/// No token is returned; the new administrator logs in separately.
pub async fn create_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): JsonBody<CreateAdminRequest>,
) -> Result<(StatusCode, Json<PrincipalResponse>), ApiError> {
    require_text("nome", &req.nome, 100)?;
    validate_email("email", &req.email)?;
    validate_password("senha", &req.senha)?;

    let admin = state
        .auth
        .create_principal(
            PrincipalKind::Administrator,
            Registration {
                name: req.nome,
                email: req.email,
                password: req.senha,
                role: Some(RoleMarker::Admin(req.is_admin)),
                phone: None,
            },
        )
        .await?;

    info!("👑 Administrator {} created by {}", admin.email, claims.email);

    Ok((
        StatusCode::CREATED,
        Json(PrincipalResponse::from_record(&admin)),
    ))
}

/// Current principal - GET /api/perfil
/// Built from the token claims alone, no database lookup.
pub async fn get_profile(Extension(claims): Extension<Claims>) -> Json<ProfileResponse> {
    Json(ProfileResponse::from_claims(&claims))
}

fn require_plain_user(claims: &Claims) -> Result<(), ApiError> {
    if claims.is_plain_user() {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Change login email - PUT /api/perfil/email
pub async fn update_email(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): JsonBody<UpdateEmailRequest>,
) -> Result<Json<Value>, ApiError> {
    require_plain_user(&claims)?;
    validate_email("novo_email", &req.novo_email)?;

    if normalize_email(&req.email_atual) != normalize_email(&claims.email) {
        return Err(ApiError::Unauthorized);
    }

    let new_email = normalize_email(&req.novo_email);
    if new_email != normalize_email(&req.confirmar_email) {
        return Err(ApiError::BadRequest(
            "field 'confirmar_email' must match 'novo_email'".to_string(),
        ));
    }

    let user = state
        .auth
        .confirm_password(PrincipalKind::User, claims.id, &req.senha)
        .await?;

    if state.db.user_email_taken_by_other(&new_email, user.id)? {
        return Err(ApiError::Conflict("Email already in use".to_string()));
    }

    state
        .db
        .update_user_email(user.id, &new_email)
        .map_err(|e| {
            if e.downcast_ref::<DuplicateEmail>().is_some() {
                ApiError::Conflict("Email already in use".to_string())
            } else {
                ApiError::Internal(e)
            }
        })?;

    // Outstanding tokens keep the old email until they expire.
    let (token, expires_in) = state.auth.jwt().generate_token(user.id, &new_email, None)?;

    info!("📧 User {} changed email", user.id);

    Ok(Json(json!({
        "message": "Email updated",
        "novo_email": new_email,
        "token": token,
        "expires_in": expires_in,
    })))
}

/// Change phone number - PUT /api/perfil/telefone
pub async fn update_phone(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): JsonBody<UpdatePhoneRequest>,
) -> Result<Json<Value>, ApiError> {
    require_plain_user(&claims)?;
    require_text("novo_telefone", &req.novo_telefone, 20)?;

    let new_phone = req.novo_telefone.trim();
    if new_phone != req.confirmar_telefone.trim() {
        return Err(ApiError::BadRequest(
            "field 'confirmar_telefone' must match 'novo_telefone'".to_string(),
        ));
    }

    let user = state
        .auth
        .confirm_password(PrincipalKind::User, claims.id, &req.senha)
        .await?;

    let given_current = req
        .telefone_atual
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());
    if user.phone.as_deref() != given_current {
        warn!("Phone change for user {} with mismatched current phone", user.id);
        return Err(ApiError::Conflict(
            "Current phone does not match the one on record".to_string(),
        ));
    }

    state.db.update_user_phone(user.id, new_phone)?;

    Ok(Json(json!({
        "message": "Phone updated",
        "novo_telefone": new_phone,
    })))
}

/// List employees - GET /api/admin/funcionarios (Admin only)
pub async fn list_employees(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmployeeSummary>>, ApiError> {
    Ok(Json(state.db.list_employees()?))
}

#[derive(Debug, Deserialize)]
pub struct UserSearch {
    pub busca: Option<String>,
}

/// List users - GET /api/admin/usuarios?busca= (Admin only)
pub async fn list_users(
    State(state): State<AppState>,
    WithRejection(Query(params), _): QueryParams<UserSearch>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    Ok(Json(state.db.list_users(params.busca.as_deref())?))
}

/// Create the configured administrator if the store has none yet.
///
/// An existing `administradores` row with the same email, even one with
/// `is_admin` off, counts as already provisioned.
pub async fn bootstrap_admin(
    auth: &AuthService,
    db: &Database,
    email: &str,
    password: &str,
    name: &str,
) -> Result<bool> {
    if db.count_administrators()? > 0 {
        return Ok(false);
    }

    validate_email("ADMIN_EMAIL", email).context("Invalid bootstrap administrator email")?;
    validate_password("ADMIN_PASSWORD", password)
        .context("Invalid bootstrap administrator password")?;

    let created = auth
        .create_principal(
            PrincipalKind::Administrator,
            Registration {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role: Some(RoleMarker::Admin(true)),
                phone: None,
            },
        )
        .await;

    match created {
        Ok(_) => {
            info!("🔐 Bootstrap administrator created: {}", email);
            Ok(true)
        }
        Err(ApiError::Conflict(_)) => {
            warn!(
                "⚠️ Bootstrap administrator {} already exists without admin rights; leaving it unchanged",
                email
            );
            Ok(false)
        }
        Err(e) => Err(e).context("Failed to create bootstrap administrator"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{BcryptHasher, JwtHandler};
    use std::sync::Arc;

    fn state() -> AppState {
        let db = Arc::new(Database::in_memory().unwrap());
        let hasher = Arc::new(BcryptHasher::new(4).unwrap());
        let jwt = Arc::new(JwtHandler::new("api-test-secret".to_string()));
        AppState::new(db, hasher, jwt)
    }

    #[tokio::test]
    async fn test_bootstrap_admin_only_once() {
        let state = state();
        assert!(
            bootstrap_admin(&state.auth, &state.db, "root@x.com", "changeme", "Root")
                .await
                .unwrap()
        );
        assert!(
            !bootstrap_admin(&state.auth, &state.db, "other@x.com", "changeme", "Other")
                .await
                .unwrap()
        );
        assert_eq!(state.db.count_administrators().unwrap(), 1);

        let out = state
            .auth
            .login(PrincipalKind::Administrator, "root@x.com", "changeme")
            .await
            .unwrap();
        let claims = state.auth.jwt().validate_token(&out.token).unwrap();
        assert_eq!(claims.is_admin, Some(true));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_rejects_weak_password() {
        let state = state();
        assert!(
            bootstrap_admin(&state.auth, &state.db, "root@x.com", "123", "Root")
                .await
                .is_err()
        );
        assert_eq!(state.db.count_administrators().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_keeps_disabled_admin_row() {
        let state = state();
        state
            .auth
            .create_principal(
                PrincipalKind::Administrator,
                Registration {
                    name: "Old root".to_string(),
                    email: "root@x.com".to_string(),
                    password: "changeme".to_string(),
                    role: Some(RoleMarker::Admin(false)),
                    phone: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(state.db.count_administrators().unwrap(), 0);

        let created = bootstrap_admin(&state.auth, &state.db, "root@x.com", "changeme", "Root")
            .await
            .unwrap();
        assert!(!created);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_error_names_cause() {
        let state = state();
        let err = bootstrap_admin(&state.auth, &state.db, "not-an-email", "changeme", "Root")
            .await
            .unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("Invalid bootstrap administrator email"));
        assert!(chain.contains("'ADMIN_EMAIL'"));
    }

    #[tokio::test]
    async fn test_profile_from_claims() {
        let claims = Claims {
            id: 4,
            email: "f@x.com".to_string(),
            cargo: Some("ti".to_string()),
            is_admin: None,
            iat: 0,
            exp: 1,
        };
        let Json(profile) = get_profile(Extension(claims)).await;
        assert_eq!(profile.id, 4);
        assert_eq!(profile.tipo, "funcionario");
        assert_eq!(profile.cargo.as_deref(), Some("ti"));
    }
}
