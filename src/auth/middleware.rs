// Authentication extractors for protected routes

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::{error::AuthError, models::Role, token::TokenService};

/// Who is acting, resolved to the profile id their role works through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer(i32),
    Dealer(i32),
    Admin,
}

/// Any user holding a valid access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub customer_id: Option<i32>,
    pub dealer_id: Option<i32>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn actor(&self) -> Result<Actor, AuthError> {
        match (self.role, self.customer_id, self.dealer_id) {
            (Role::Admin, _, _) => Ok(Actor::Admin),
            (Role::Customer, Some(id), _) => Ok(Actor::Customer(id)),
            (Role::Dealer, _, Some(id)) => Ok(Actor::Dealer(id)),
            (role, _, _) => Err(AuthError::Forbidden(format!(
                "{} profile not found for this account",
                role
            ))),
        }
    }

    fn require(self, required: Role) -> Result<Self, AuthError> {
        if self.role == required {
            Ok(self)
        } else {
            Err(AuthError::InsufficientPermissions {
                required,
                actual: self.role,
            })
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AuthError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;
    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or(AuthError::InvalidToken)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or(AuthError::MissingToken)?;
        let tokens = Arc::<TokenService>::from_ref(state);
        let claims = tokens.validate_access_token(token)?;

        debug!("Authenticated user {} ({})", claims.sub, claims.role);
        Ok(AuthenticatedUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
            customer_id: claims.customer_id,
            dealer_id: claims.dealer_id,
        })
    }
}

/// Present when a valid bearer token was sent, `None` for anonymous calls
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if bearer_token(parts)?.is_none() {
            return Ok(MaybeUser(None));
        }
        AuthenticatedUser::from_request_parts(parts, state)
            .await
            .map(|user| MaybeUser(Some(user)))
    }
}

/// A customer account with its customer profile id
#[derive(Debug, Clone)]
pub struct AuthCustomer {
    pub user: AuthenticatedUser,
    pub customer_id: i32,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthCustomer
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state)
            .await?
            .require(Role::Customer)?;
        let customer_id = user
            .customer_id
            .ok_or_else(|| AuthError::Forbidden("Customer profile not found".to_string()))?;
        Ok(AuthCustomer { user, customer_id })
    }
}

/// A dealer account with its dealer profile id
#[derive(Debug, Clone)]
pub struct AuthDealer {
    pub user: AuthenticatedUser,
    pub dealer_id: i32,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthDealer
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state)
            .await?
            .require(Role::Dealer)?;
        let dealer_id = user
            .dealer_id
            .ok_or_else(|| AuthError::Forbidden("Dealer profile not found".to_string()))?;
        Ok(AuthDealer { user, dealer_id })
    }
}

#[derive(Debug, Clone)]
pub struct AuthAdmin(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthAdmin
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state)
            .await?
            .require(Role::Admin)?;
        Ok(AuthAdmin(user))
    }
}

/// Dealer or admin: the staff side of appointments and inventory
#[derive(Debug, Clone)]
pub struct AuthStaff {
    pub user: AuthenticatedUser,
    pub actor: Actor,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthStaff
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        match user.actor()? {
            Actor::Customer(_) => Err(AuthError::InsufficientPermissions {
                required: Role::Dealer,
                actual: Role::Customer,
            }),
            actor => Ok(AuthStaff { user, actor }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenSubject;
    use axum::http::Request;

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new("test_secret_key_for_testing_purposes".to_string()))
    }

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn bearer(tokens: &TokenService, role: Role, customer_id: Option<i32>, dealer_id: Option<i32>) -> String {
        let subject = TokenSubject {
            user_id: 42,
            username: "someone".to_string(),
            role,
            customer_id,
            dealer_id,
        };
        format!("Bearer {}", tokens.generate_access_token(&subject).unwrap())
    }

    #[tokio::test]
    async fn test_valid_token_is_accepted() {
        let state = tokens();
        let header = bearer(&state, Role::Customer, Some(3), None);
        let mut parts = parts_with_auth(Some(&header));

        let user = AuthenticatedUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.actor().unwrap(), Actor::Customer(3));
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        let state = tokens();
        let mut parts = parts_with_auth(None);
        let result = AuthenticatedUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_non_bearer_schemes_are_rejected() {
        let state = tokens();
        for value in ["Basic dXNlcjpwYXNz", "token_without_bearer", "Bearer not.a.jwt"] {
            let mut parts = parts_with_auth(Some(value));
            let result = AuthenticatedUser::from_request_parts(&mut parts, &state).await;
            assert!(matches!(result, Err(AuthError::InvalidToken)), "{}", value);
        }
    }

    #[tokio::test]
    async fn test_maybe_user_allows_anonymous() {
        let state = tokens();
        let mut parts = parts_with_auth(None);
        let MaybeUser(user) = MaybeUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_customer_extractor_rejects_dealer() {
        let state = tokens();
        let header = bearer(&state, Role::Dealer, None, Some(2));
        let mut parts = parts_with_auth(Some(&header));
        let result = AuthCustomer::from_request_parts(&mut parts, &state).await;
        assert!(matches!(
            result,
            Err(AuthError::InsufficientPermissions { required: Role::Customer, actual: Role::Dealer })
        ));
    }

    #[tokio::test]
    async fn test_dealer_extractor_exposes_dealer_id() {
        let state = tokens();
        let header = bearer(&state, Role::Dealer, None, Some(2));
        let mut parts = parts_with_auth(Some(&header));
        let dealer = AuthDealer::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(dealer.dealer_id, 2);
    }

    #[tokio::test]
    async fn test_admin_extractor() {
        let state = tokens();
        let admin = bearer(&state, Role::Admin, None, None);
        let mut parts = parts_with_auth(Some(&admin));
        assert!(AuthAdmin::from_request_parts(&mut parts, &state).await.is_ok());

        let customer = bearer(&state, Role::Customer, Some(1), None);
        let mut parts = parts_with_auth(Some(&customer));
        assert!(AuthAdmin::from_request_parts(&mut parts, &state).await.is_err());
    }

    #[tokio::test]
    async fn test_staff_extractor_accepts_dealer_and_admin_only() {
        let state = tokens();
        for (role, dealer_id, ok) in [
            (Role::Dealer, Some(4), true),
            (Role::Admin, None, true),
            (Role::Customer, None, false),
        ] {
            let customer_id = (role == Role::Customer).then_some(1);
            let header = bearer(&state, role, customer_id, dealer_id);
            let mut parts = parts_with_auth(Some(&header));
            let result = AuthStaff::from_request_parts(&mut parts, &state).await;
            assert_eq!(result.is_ok(), ok, "{:?}", role);
        }
    }

    #[test]
    fn test_dealer_without_profile_has_no_actor() {
        let user = AuthenticatedUser {
            user_id: 1,
            username: "ghost".into(),
            role: Role::Dealer,
            customer_id: None,
            dealer_id: None,
        };
        assert!(matches!(user.actor(), Err(AuthError::Forbidden(_))));
    }
}
