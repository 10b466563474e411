use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{admin, catalog, news, tickets};
use crate::auth::{
    api as auth_api, auth_middleware, optional_auth_middleware, require_role, AuthService,
    CredentialStore, JwtHandler, PasswordHasher, RoleRequirement,
};
use crate::middleware::request_logging;
use crate::store::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(db: Arc<Database>, hasher: Arc<dyn PasswordHasher>, jwt: Arc<JwtHandler>) -> Self {
        let store: Arc<dyn CredentialStore> = db.clone();
        Self {
            auth: AuthService::new(store, hasher, jwt),
            db,
        }
    }

    pub fn jwt(&self) -> Arc<JwtHandler> {
        self.auth.jwt().clone()
    }
}

/// Put `routes` behind the authentication gate and, when given, a role gate.
///
/// `route_layer` wraps outside-in, so the authentication layer is added last
/// and runs first.
fn gated(
    routes: Router<AppState>,
    jwt: Arc<JwtHandler>,
    role: Option<RoleRequirement>,
) -> Router<AppState> {
    let routes = match role {
        Some(role) => routes.route_layer(middleware::from_fn_with_state(role, require_role)),
        None => routes,
    };
    routes.route_layer(middleware::from_fn_with_state(jwt, auth_middleware))
}

/// Create the API router
pub fn build_router(state: AppState) -> Router {
    let jwt = state.jwt();

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/registrar", post(auth_api::register_user))
        .route("/api/auth/login", post(auth_api::login_user))
        .route("/api/auth/funcionarios/login", post(auth_api::login_employee))
        .route("/api/admin/login", post(auth_api::login_admin))
        .route("/api/produtos", get(catalog::list_products))
        .route("/api/produtos/:id", get(catalog::get_product))
        .route("/api/servicos", get(catalog::list_services))
        .route("/api/servicos/:id", get(catalog::get_service))
        .route("/api/noticias", get(news::list_news))
        .route("/api/noticias/:id", get(news::get_news))
        .route("/api/contatos", post(tickets::create_contact));

    // Anonymous submissions are fine; a valid token tags the ticket.
    let optional_auth_routes = Router::new()
        .route("/api/suporte", post(tickets::create_ticket))
        .route_layer(middleware::from_fn_with_state(
            jwt.clone(),
            optional_auth_middleware,
        ));

    let authenticated_routes = gated(
        Router::new()
            .route("/api/perfil", get(auth_api::get_profile))
            .route("/api/perfil/email", put(auth_api::update_email))
            .route("/api/perfil/telefone", put(auth_api::update_phone))
            .route("/api/suporte/minhas", get(tickets::list_my_tickets)),
        jwt.clone(),
        None,
    );

    let employee_routes = gated(
        Router::new()
            .route("/api/produtos", post(catalog::create_product))
            .route(
                "/api/produtos/:id",
                put(catalog::update_product).delete(catalog::delete_product),
            )
            .route("/api/noticias", post(news::create_news))
            .route(
                "/api/noticias/:id",
                put(news::update_news).delete(news::delete_news),
            ),
        jwt.clone(),
        Some(RoleRequirement::Employee),
    );

    let admin_routes = gated(
        Router::new()
            .route(
                "/api/auth/funcionarios/registrar",
                post(auth_api::register_employee),
            )
            .route("/api/admin/funcionarios", get(auth_api::list_employees))
            .route("/api/admin/usuarios", get(auth_api::list_users))
            .route("/api/admin/administradores", post(auth_api::create_admin))
            .route("/api/admin/dashboard", get(admin::dashboard))
            .route("/api/servicos", post(catalog::create_service))
            .route(
                "/api/servicos/:id",
                put(catalog::update_service).delete(catalog::delete_service),
            )
            .route("/api/suporte", get(tickets::list_tickets))
            .route(
                "/api/suporte/:id",
                get(tickets::get_ticket).delete(tickets::delete_ticket),
            )
            .route("/api/suporte/:id/status", put(tickets::update_ticket_status))
            .route("/api/contatos", get(tickets::list_contacts))
            .route(
                "/api/contatos/:id",
                get(tickets::get_contact).delete(tickets::delete_contact),
            )
            .route(
                "/api/contatos/:id/status",
                put(tickets::update_contact_status),
            ),
        jwt,
        Some(RoleRequirement::Administrator),
    );

    Router::new()
        .merge(public_routes)
        .merge(optional_auth_routes)
        .merge(authenticated_routes)
        .merge(employee_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::BcryptHasher;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        let db = Arc::new(Database::in_memory().unwrap());
        let hasher = Arc::new(BcryptHasher::new(4).unwrap());
        let jwt = Arc::new(JwtHandler::new("routes-test-secret".to_string()));
        build_router(AppState::new(db, hasher, jwt))
    }

    async fn status_of(app: Router, method: &str, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        assert_eq!(status_of(app(), "GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_public_reads_need_no_token() {
        assert_eq!(status_of(app(), "GET", "/api/produtos").await, StatusCode::OK);
        assert_eq!(
            status_of(app(), "GET", "/api/produtos?ofertas=true").await,
            StatusCode::OK
        );
        assert_eq!(status_of(app(), "GET", "/api/noticias").await, StatusCode::OK);
        assert_eq!(status_of(app(), "GET", "/api/servicos").await, StatusCode::OK);
        assert_eq!(
            status_of(app(), "GET", "/api/produtos/99").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_gated_routes_reject_missing_token() {
        for (method, uri) in [
            ("GET", "/api/perfil"),
            ("GET", "/api/suporte/minhas"),
            ("POST", "/api/produtos"),
            ("DELETE", "/api/noticias/1"),
            ("POST", "/api/servicos"),
            ("GET", "/api/suporte"),
            ("GET", "/api/contatos"),
            ("GET", "/api/admin/dashboard"),
            ("POST", "/api/auth/funcionarios/registrar"),
        ] {
            assert_eq!(
                status_of(app(), method, uri).await,
                StatusCode::UNAUTHORIZED,
                "{} {}",
                method,
                uri
            );
        }
    }

    #[tokio::test]
    async fn test_anonymous_submissions_reach_validation() {
        // Body is `{}`, so the request gets past the gates and fails on fields.
        assert_eq!(
            status_of(app(), "POST", "/api/suporte").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(app(), "POST", "/api/contatos").await,
            StatusCode::BAD_REQUEST
        );
    }
}
