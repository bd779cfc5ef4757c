//! HTTP server assembly

use crate::api;
use crate::config::Config;
use crate::error::Result;
use crate::jwt::JwtManager;
use crate::policy::PermissionChecker;
use crate::repository::{
    AuthzRepositoryImpl, ReferenceRepositoryImpl, TenantAuthzRepositoryImpl, TenantRepository,
    TenantRepositoryImpl, UserRepository, UserRepositoryImpl,
};
use crate::service::{AuthService, AuthzService, ReferenceService, TenantAuthzService};
use async_trait::async_trait;
use axum::extract::FromRef;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub type AuthSvc = AuthService<UserRepositoryImpl, TenantRepositoryImpl>;
pub type AuthzSvc = AuthzService<AuthzRepositoryImpl>;
pub type TenantAuthzSvc = TenantAuthzService<TenantAuthzRepositoryImpl>;
pub type ReferenceSvc = ReferenceService<ReferenceRepositoryImpl>;

/// Bridges the endpoint gate onto the two scope services and the
/// principal stores.
pub struct Gate {
    authz: Arc<AuthzSvc>,
    tenant_authz: Arc<TenantAuthzSvc>,
    users: Arc<UserRepositoryImpl>,
    tenants: Arc<TenantRepositoryImpl>,
}

impl Gate {
    pub fn new(
        authz: Arc<AuthzSvc>,
        tenant_authz: Arc<TenantAuthzSvc>,
        users: Arc<UserRepositoryImpl>,
        tenants: Arc<TenantRepositoryImpl>,
    ) -> Self {
        Self {
            authz,
            tenant_authz,
            users,
            tenants,
        }
    }
}

#[async_trait]
impl PermissionChecker for Gate {
    async fn global_principal_exists(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.users.find_by_id(user_id).await?.is_some())
    }

    async fn tenant_principal_exists(&self, tenant_user_id: Uuid) -> Result<bool> {
        Ok(self
            .tenants
            .find_tenant_user_by_id(tenant_user_id)
            .await?
            .is_some())
    }

    async fn holds_global(&self, user_id: Uuid, code: &str) -> Result<bool> {
        self.authz.check_permission(user_id, code).await
    }

    async fn holds_tenant(&self, tenant_user_id: Uuid, code: &str) -> Result<bool> {
        self.tenant_authz.check_permission(tenant_user_id, code).await
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt: Arc<JwtManager>,
    pub users: Arc<UserRepositoryImpl>,
    pub tenants: Arc<TenantRepositoryImpl>,
    pub auth: Arc<AuthSvc>,
    pub authz: Arc<AuthzSvc>,
    pub tenant_authz: Arc<TenantAuthzSvc>,
    pub reference: Arc<ReferenceSvc>,
    pub gate: Arc<Gate>,
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health::health))
        // Authentication
        .route("/api/v1/auth/register", post(api::auth::register))
        .route("/api/v1/auth/login", post(api::auth::login))
        .route(
            "/api/v1/tenants/{tenant_id}/auth/login",
            post(api::auth::tenant_login),
        )
        // Platform administration
        .route("/api/v1/tenants", post(api::tenant::create_tenant))
        .route("/api/v1/tenants", get(api::tenant::list_tenants))
        .route("/api/v1/tenants/{tenant_id}", get(api::tenant::get_tenant))
        .route(
            "/api/v1/users/{user_id}/suspension",
            put(api::user::set_suspension),
        )
        // Global principal introspection
        .route("/api/v1/me/permissions", get(api::authz::my_permissions))
        .route(
            "/api/v1/me/permissions/check",
            get(api::authz::check_my_permission),
        )
        .route("/api/v1/me/pages", get(api::authz::my_pages))
        // Global permission catalog and role management
        .route("/api/v1/permissions", get(api::authz::list_permissions))
        .route("/api/v1/roles", post(api::authz::create_role))
        .route("/api/v1/roles", get(api::authz::list_roles))
        .route("/api/v1/roles/{role_id}", get(api::authz::get_role))
        .route("/api/v1/roles/{role_id}", put(api::authz::update_role))
        .route("/api/v1/roles/{role_id}", delete(api::authz::delete_role))
        .route(
            "/api/v1/roles/{role_id}/permissions/{permission_id}",
            post(api::authz::assign_permission),
        )
        .route(
            "/api/v1/roles/{role_id}/permissions/{permission_id}",
            delete(api::authz::remove_permission),
        )
        .route(
            "/api/v1/users/{user_id}/roles",
            get(api::authz::get_user_roles),
        )
        .route(
            "/api/v1/users/{user_id}/roles",
            put(api::authz::put_user_roles),
        )
        .route(
            "/api/v1/users/{user_id}/roles/{role_id}",
            delete(api::authz::delete_user_role),
        )
        // Tenant principal introspection
        .route(
            "/api/v1/tenants/{tenant_id}/me/permissions",
            get(api::tenant_authz::my_permissions),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/me/permissions/check",
            get(api::tenant_authz::check_my_permission),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/me/pages",
            get(api::tenant_authz::my_pages),
        )
        // Tenant permission catalog and role management
        .route(
            "/api/v1/tenants/{tenant_id}/permissions",
            get(api::tenant_authz::list_permissions),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/roles",
            post(api::tenant_authz::create_role),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/roles",
            get(api::tenant_authz::list_roles),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/roles/{role_id}",
            get(api::tenant_authz::get_role),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/roles/{role_id}",
            put(api::tenant_authz::update_role),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/roles/{role_id}",
            delete(api::tenant_authz::delete_role),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/roles/{role_id}/permissions/{permission_id}",
            post(api::tenant_authz::assign_permission),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/roles/{role_id}/permissions/{permission_id}",
            delete(api::tenant_authz::remove_permission),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/users/{tenant_user_id}/roles",
            get(api::tenant_authz::get_user_roles),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/users/{tenant_user_id}/roles",
            put(api::tenant_authz::put_user_roles),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/users/{tenant_user_id}/roles/{role_id}",
            delete(api::tenant_authz::delete_user_role),
        )
        // Reference data: tenant-visible reads, platform-level writes
        .route(
            "/api/v1/tenants/{tenant_id}/asn-registries",
            get(api::reference::list_asn_registries),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/asn-registries/{id}",
            get(api::reference::get_asn_registry),
        )
        .route(
            "/api/v1/asn-registries",
            post(api::reference::create_asn_registry),
        )
        .route(
            "/api/v1/asn-registries/{id}",
            delete(api::reference::delete_asn_registry),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/protocols",
            get(api::reference::list_protocols),
        )
        .route(
            "/api/v1/tenants/{tenant_id}/protocols/{id}",
            get(api::reference::get_protocol),
        )
        .route("/api/v1/protocols", post(api::reference::create_protocol))
        .route(
            "/api/v1/protocols/{id}",
            delete(api::reference::delete_protocol),
        )
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!("Connected to database");

    let config = Arc::new(config);
    let jwt = Arc::new(JwtManager::new(config.jwt.clone()));

    let users = Arc::new(UserRepositoryImpl::new(pool.clone()));
    let tenants = Arc::new(TenantRepositoryImpl::new(pool.clone()));
    let authz_repo = Arc::new(AuthzRepositoryImpl::new(pool.clone()));
    let tenant_authz_repo = Arc::new(TenantAuthzRepositoryImpl::new(pool.clone()));
    let reference_repo = Arc::new(ReferenceRepositoryImpl::new(pool));

    let auth = Arc::new(AuthService::new(users.clone(), tenants.clone(), jwt.clone()));
    let authz = Arc::new(AuthzService::new(authz_repo));
    let tenant_authz = Arc::new(TenantAuthzService::new(tenant_authz_repo));
    let reference = Arc::new(ReferenceService::new(reference_repo));
    let gate = Arc::new(Gate::new(
        authz.clone(),
        tenant_authz.clone(),
        users.clone(),
        tenants.clone(),
    ));

    let state = AppState {
        config: config.clone(),
        jwt,
        users,
        tenants,
        auth,
        authz,
        tenant_authz,
        reference,
        gate,
    };

    let router = build_router(state);
    let addr = config.http_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
