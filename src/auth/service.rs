// Authentication service - business logic layer

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, LoginRequest, NewProfile, RegisterRequest, Role, User, UserResponse},
    password::PasswordService,
    repository::{TokenRepository, UserRepository},
    token::{TokenService, TokenSubject},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    token_repo: TokenRepository,
    token_service: Arc<TokenService>,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        token_repo: TokenRepository,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            token_service,
        }
    }

    /// Create a customer or dealer account together with its profile
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AuthError> {
        request.validate()?;
        let profile = request.profile().map_err(AuthError::ValidationError)?;
        let username = request.username.trim();

        if self.user_repo.username_exists(username, None).await? {
            return Err(AuthError::UsernameTaken);
        }
        if let NewProfile::Customer { phone, email, .. } = &profile {
            if self.user_repo.customer_phone_exists(phone, None).await? {
                return Err(AuthError::PhoneTaken);
            }
            if self.user_repo.customer_email_exists(email, None).await? {
                return Err(AuthError::EmailTaken);
            }
        }

        let password_hash = PasswordService::hash_password(&request.password)?;
        let user = self
            .user_repo
            .create_with_profile(username, &password_hash, request.role, &profile)
            .await?;

        info!("Registered user {} with role {}", user.id, user.role);
        self.profile_of(user).await
    }

    /// Verify credentials and issue a token pair
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let user = match self.user_repo.find_active_by_username(request.username.trim()).await? {
            Some(user) => user,
            None => {
                debug!("Login attempt for unknown user {}", request.username);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !PasswordService::verify_password(&request.password, &user.password_hash) {
            warn!("Failed login for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let profile = self.profile_of(user).await?;
        info!("User {} logged in", profile.id);
        self.issue_tokens(profile).await
    }

    /// Exchange a stored refresh token for a new pair; the old token is revoked
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        let claims = self.token_service.validate_refresh_token(refresh_token)?;

        if self.token_repo.find_valid(refresh_token).await?.is_none() {
            warn!("Refresh token for user {} is not on record", claims.sub);
            return Err(AuthError::InvalidToken);
        }
        self.token_repo.invalidate_token(refresh_token).await?;

        let profile = self.get_current_user(claims.sub).await?;
        self.issue_tokens(profile).await
    }

    /// Revoke a refresh token. Unknown tokens are treated as already revoked.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let removed = self.token_repo.invalidate_token(refresh_token).await?;
        debug!("Logout revoked {} token(s)", u8::from(removed));
        Ok(())
    }

    /// Profile of an active user
    pub async fn get_current_user(&self, user_id: i32) -> Result<UserResponse, AuthError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .filter(|u| !u.is_deleted)
            .ok_or(AuthError::UserNotFound)?;
        self.profile_of(user).await
    }

    /// Create the configured admin account if it does not exist yet
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        if self.user_repo.username_exists(username, None).await? {
            return Ok(false);
        }
        PasswordService::validate_password_strength(password)?;
        let hash = PasswordService::hash_password(password)?;
        let user = self
            .user_repo
            .create_with_profile(username, &hash, Role::Admin, &NewProfile::None)
            .await?;
        info!("Created bootstrap admin account {}", user.id);
        Ok(true)
    }

    pub(crate) async fn profile_of(&self, user: User) -> Result<UserResponse, AuthError> {
        let (customer, dealer) = match user.role {
            Role::Customer => (self.user_repo.find_customer_by_user(user.id).await?, None),
            Role::Dealer => (None, self.user_repo.find_dealer_by_user(user.id).await?),
            Role::Admin => (None, None),
        };
        Ok(UserResponse::new(user, customer, dealer))
    }

    async fn issue_tokens(&self, user: UserResponse) -> Result<AuthResponse, AuthError> {
        let subject = subject_for(&user);
        let (access_token, refresh_token) = self.token_service.generate_token_pair(&subject)?;

        let expires_at = Utc::now() + Duration::seconds(self.token_service.refresh_token_duration());
        self.token_repo
            .store_refresh_token(user.id, &refresh_token, expires_at)
            .await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: self.token_service.access_token_duration(),
            user,
        })
    }
}

/// Token identity for a loaded profile
pub fn subject_for(user: &UserResponse) -> TokenSubject {
    TokenSubject {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role,
        customer_id: user.customer.as_ref().map(|c| c.id),
        dealer_id: user.dealer.as_ref().map(|d| d.id),
    }
}
