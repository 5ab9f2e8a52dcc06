//! HTTP Handlers

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use platform::mail::MailTransport;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    ChangePasswordInput, ChangePasswordUseCase, EmailVerificationUseCase, GetUserUseCase,
    SignInInput, SignInUseCase, SignUpInput, SignUpUseCase, TokenIssuer,
};
use crate::domain::entity::{user::User, verification_token::VerificationReason};
use crate::domain::repository::{UserRepository, VerificationTokenRepository};
use crate::domain::value_object::{user_id::UserId, user_role::UserRole};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AdminCreateUserRequest, ChangePasswordRequest, LoginRequest, LoginResponse,
    ResendVerificationRequest, SignUpRequest, UserResponse, VerifyEmailRequest,
    VerifyEmailResponse,
};
use crate::presentation::middleware::CurrentUser;

/// Shared state for auth handlers
pub struct AuthAppState<R, M>
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub issuer: Arc<TokenIssuer>,
    pub config: Arc<AuthConfig>,
}

impl<R, M> Clone for AuthAppState<R, M>
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            mailer: self.mailer.clone(),
            issuer: self.issuer.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, M> AuthAppState<R, M>
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    fn verification(&self) -> EmailVerificationUseCase<R, R, M> {
        EmailVerificationUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.mailer.clone(),
            self.config.clone(),
        )
    }

    /// Create the user, then mail the first code in the background
    async fn register(&self, input: SignUpInput) -> AuthResult<User> {
        let user = SignUpUseCase::new(self.repo.clone()).execute(input).await?;

        self.verification()
            .spawn_send(user.email.clone(), VerificationReason::Registration);

        Ok(user)
    }
}

// ============================================================================
// Login / Logout
// ============================================================================

/// POST /login
///
/// The token is returned both as the session cookie and in the
/// `Authorization` response header for non-browser clients.
pub async fn login<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(state.repo.clone(), state.issuer.clone());

    let output = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    let cookie = state
        .config
        .cookie()
        .build_set_cookie(&output.token.token, output.token.max_age_secs());
    let bearer = format!("Bearer {}", output.token.token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie), (header::AUTHORIZATION, bearer)],
        Json(LoginResponse {
            user: UserResponse::from(&output.user),
            expires_at: output.token.claims.exp,
        }),
    ))
}

/// POST /logout
///
/// Clears the cookie. Tokens are stateless, so a copied token stays valid
/// until it expires.
pub async fn logout<R, M>(State(state): State<AuthAppState<R, M>>) -> impl IntoResponse
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.config.cookie().build_delete_cookie())],
    )
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /users/create
pub async fn create_user<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<(StatusCode, Json<UserResponse>)>
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let user = state
        .register(SignUpInput {
            email: req.email,
            display_name: req.display_name,
            password: req.password,
            role: UserRole::User,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /admin/users/create
pub async fn admin_create_user<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Json(req): Json<AdminCreateUserRequest>,
) -> AuthResult<(StatusCode, Json<UserResponse>)>
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let user = state
        .register(SignUpInput {
            email: req.email,
            display_name: req.display_name,
            password: req.password,
            role: req.role,
        })
        .await?;

    tracing::info!(
        admin_id = %admin.sub,
        user_id = %user.user_id,
        role = %user.user_role,
        "User created by admin"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

// ============================================================================
// Email Verification
// ============================================================================

/// POST /verify-email
pub async fn verify_email<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<VerifyEmailRequest>,
) -> AuthResult<Json<VerifyEmailResponse>>
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    state.verification().verify(&req.email, &req.code).await?;

    Ok(Json(VerifyEmailResponse { verified: true }))
}

/// POST /verify-email/resend
pub async fn resend_verification<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<ResendVerificationRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    state.verification().resend(&req.email).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Current User
// ============================================================================

/// GET /users/me
pub async fn current_user<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(CurrentUser(claims)): Extension<CurrentUser>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let user = GetUserUseCase::new(state.repo.clone())
        .execute(&claims.sub)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// POST /users/me/password
pub async fn change_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(CurrentUser(claims)): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(AuthError::InvalidInput(
            "Current and new password are required".into(),
        ));
    }

    ChangePasswordUseCase::new(state.repo.clone())
        .execute(
            &claims.sub,
            ChangePasswordInput {
                current_password: req.current_password,
                new_password: req.new_password,
            },
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Admin
// ============================================================================

/// GET /admin/users/{id}
pub async fn get_user<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Path(user_id): Path<String>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let user_id: UserId = user_id
        .parse()
        .map_err(|_| AuthError::InvalidInput("Invalid user id".into()))?;

    let user = GetUserUseCase::new(state.repo.clone())
        .execute(&user_id)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}
