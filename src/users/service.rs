use tracing::info;
use validator::Validate;

use crate::auth::{
    password::PasswordService, AccountChanges, AuthError, AuthService, AuthenticatedUser, Role,
    TokenRepository, UserRepository, UserResponse,
};
use crate::users::UpdateUserRequest;
use crate::validation::normalize_optional;

#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    tokens: TokenRepository,
    auth: AuthService,
}

impl UserService {
    pub fn new(users: UserRepository, tokens: TokenRepository, auth: AuthService) -> Self {
        Self { users, tokens, auth }
    }

    /// Active users, optionally restricted to one role
    pub async fn list(&self, role: Option<Role>) -> Result<Vec<UserResponse>, AuthError> {
        let users = self.users.list(role).await?;
        let mut profiles = Vec::with_capacity(users.len());
        for user in users {
            profiles.push(self.auth.profile_of(user).await?);
        }
        Ok(profiles)
    }

    pub async fn get(&self, caller: &AuthenticatedUser, id: i32) -> Result<UserResponse, AuthError> {
        ensure_self_or_admin(caller, id)?;
        self.auth.get_current_user(id).await
    }

    pub async fn update(
        &self,
        caller: &AuthenticatedUser,
        id: i32,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, AuthError> {
        ensure_self_or_admin(caller, id)?;
        request.validate()?;

        let current = self.auth.get_current_user(id).await?;
        let changes = AccountChanges {
            username: normalize_optional(request.username),
            password_hash: match request.password.filter(|p| !p.is_empty()) {
                Some(password) => Some(PasswordService::hash_password(&password)?),
                None => None,
            },
            customer_name: normalize_optional(request.customer_name),
            customer_phone: normalize_optional(request.customer_phone),
            customer_email: normalize_optional(request.customer_email),
            customer_address: normalize_optional(request.customer_address),
            dealer_name: normalize_optional(request.dealer_name),
            dealer_address: normalize_optional(request.dealer_address),
            dealer_quantity: request.dealer_quantity,
        };

        if let Some(username) = &changes.username {
            if self.users.username_exists(username, Some(id)).await? {
                return Err(AuthError::UsernameTaken);
            }
        }
        if let Some(customer) = &current.customer {
            if let Some(phone) = changes.customer_phone.as_deref().filter(|p| *p != customer.phone) {
                if self.users.customer_phone_exists(phone, Some(customer.id)).await? {
                    return Err(AuthError::PhoneTaken);
                }
            }
            if let Some(email) = changes.customer_email.as_deref().filter(|e| *e != customer.email) {
                if self.users.customer_email_exists(email, Some(customer.id)).await? {
                    return Err(AuthError::EmailTaken);
                }
            }
        }

        self.users.update_account(id, &changes).await?;
        info!("User {} updated by {}", id, caller.user_id);
        self.auth.get_current_user(id).await
    }

    /// Soft delete and revoke every refresh token of the account
    pub async fn delete(&self, caller: &AuthenticatedUser, id: i32) -> Result<(), AuthError> {
        if caller.user_id == id {
            return Err(AuthError::ValidationError(
                "You cannot delete your own account".to_string(),
            ));
        }
        if !self.users.soft_delete(id).await? {
            return Err(AuthError::UserNotFound);
        }
        let revoked = self.tokens.invalidate_all_for_user(id).await?;
        info!("User {} deleted by {}, {} token(s) revoked", id, caller.user_id, revoked);
        Ok(())
    }
}

fn ensure_self_or_admin(caller: &AuthenticatedUser, id: i32) -> Result<(), AuthError> {
    if caller.user_id == id || caller.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden(
            "You can only access your own account".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(user_id: i32, role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id,
            username: "caller".into(),
            role,
            customer_id: None,
            dealer_id: None,
        }
    }

    #[test]
    fn test_self_access_allowed() {
        assert!(ensure_self_or_admin(&caller(5, Role::Customer), 5).is_ok());
    }

    #[test]
    fn test_admin_access_allowed() {
        assert!(ensure_self_or_admin(&caller(1, Role::Admin), 5).is_ok());
    }

    #[test]
    fn test_other_user_forbidden() {
        assert!(matches!(
            ensure_self_or_admin(&caller(6, Role::Dealer), 5),
            Err(AuthError::Forbidden(_))
        ));
    }
}
