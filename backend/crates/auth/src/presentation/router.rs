//! Auth Router
//!
//! Routes are relative; the binary nests them under `/api/v1`.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use platform::mail::{MailTransport, Mailer};
use std::sync::Arc;

use crate::application::{TokenIssuer, config::AuthConfig};
use crate::domain::repository::{UserRepository, VerificationTokenRepository};
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{AuthMiddlewareState, require_admin, require_session};

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(
    repo: PgAuthRepository,
    mailer: Mailer,
    issuer: TokenIssuer,
    config: AuthConfig,
) -> Router {
    auth_router_generic(repo, mailer, issuer, config)
}

/// Create a generic Auth router for any repository and mail transport
pub fn auth_router_generic<R, M>(
    repo: R,
    mailer: M,
    issuer: TokenIssuer,
    config: AuthConfig,
) -> Router
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let state = AuthAppState {
        repo: Arc::new(repo),
        mailer: Arc::new(mailer),
        issuer: Arc::new(issuer),
        config: Arc::new(config),
    };

    let session = AuthMiddlewareState {
        issuer: state.issuer.clone(),
        config: state.config.clone(),
    };

    let public = Router::new()
        .route("/login", post(handlers::login::<R, M>))
        .route("/logout", post(handlers::logout::<R, M>))
        .route("/users/create", post(handlers::create_user::<R, M>))
        .route("/verify-email", post(handlers::verify_email::<R, M>))
        .route(
            "/verify-email/resend",
            post(handlers::resend_verification::<R, M>),
        );

    let authenticated = Router::new()
        .route("/users/me", get(handlers::current_user::<R, M>))
        .route("/users/me/password", post(handlers::change_password::<R, M>))
        .route_layer(middleware::from_fn_with_state(
            session.clone(),
            require_session,
        ));

    // The last layer added runs first: session check, then role check
    let admin = Router::new()
        .route(
            "/admin/users/create",
            post(handlers::admin_create_user::<R, M>),
        )
        .route("/admin/users/{id}", get(handlers::get_user::<R, M>))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(session, require_session));

    public.merge(authenticated).merge(admin).with_state(state)
}
