// Database repositories for accounts and refresh tokens

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Postgres, Transaction};

use crate::auth::{
    error::AuthError,
    models::{CustomerProfile, DealerProfile, NewProfile, RefreshToken, Role, User},
};
use crate::db::is_unique_violation;

const USER_COLUMNS: &str = "id, username, password_hash, role_id, is_deleted, created_at";

/// Changes applied by an account update; `None` leaves a field untouched
#[derive(Debug, Default, Clone)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub dealer_name: Option<String>,
    pub dealer_address: Option<String>,
    pub dealer_quantity: Option<i32>,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user and its profile row in one transaction
    pub async fn create_with_profile(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        profile: &NewProfile,
    ) -> Result<User, AuthError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password_hash, role_id) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique(e, AuthError::UsernameTaken))?;

        match profile {
            NewProfile::Customer {
                name,
                phone,
                email,
                address,
            } => {
                sqlx::query(
                    "INSERT INTO customers (user_id, name, phone, email, address) VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(user.id)
                .bind(name)
                .bind(phone)
                .bind(email)
                .bind(address)
                .execute(&mut *tx)
                .await
                .map_err(map_customer_unique)?;
            }
            NewProfile::Dealer {
                dealer_name,
                address,
                quantity,
            } => {
                sqlx::query(
                    "INSERT INTO dealers (user_id, dealer_name, address, quantity) VALUES ($1, $2, $3, $4)",
                )
                .bind(user.id)
                .bind(dealer_name)
                .bind(address)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
            }
            NewProfile::None => {}
        }

        tx.commit().await?;
        Ok(user)
    }

    /// Active (not soft-deleted) user by username, case-insensitive
    pub async fn find_active_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(username) = LOWER($1) AND is_deleted = FALSE",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self, role: Option<Role>) -> Result<Vec<User>, AuthError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE is_deleted = FALSE AND ($1::INT IS NULL OR role_id = $1) ORDER BY id",
            USER_COLUMNS
        ))
        .bind(role.map(|r| r.id()))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn username_exists(&self, username: &str, exclude_id: Option<i32>) -> Result<bool, AuthError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1) AND ($2::INT IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn customer_phone_exists(&self, phone: &str, exclude_id: Option<i32>) -> Result<bool, AuthError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE phone = $1 AND ($2::INT IS NULL OR id <> $2))",
        )
        .bind(phone)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn customer_email_exists(&self, email: &str, exclude_id: Option<i32>) -> Result<bool, AuthError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE LOWER(email) = LOWER($1) AND ($2::INT IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn find_customer_by_user(&self, user_id: i32) -> Result<Option<CustomerProfile>, AuthError> {
        let customer = sqlx::query_as::<_, CustomerProfile>(
            "SELECT id, user_id, name, phone, email, address FROM customers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    pub async fn find_dealer_by_user(&self, user_id: i32) -> Result<Option<DealerProfile>, AuthError> {
        let dealer = sqlx::query_as::<_, DealerProfile>(
            "SELECT id, user_id, dealer_name, address, quantity FROM dealers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(dealer)
    }

    /// Apply account changes to the user row and its profile in one transaction
    pub async fn update_account(&self, user_id: i32, changes: &AccountChanges) -> Result<(), AuthError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash)
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(&changes.username)
        .bind(&changes.password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique(e, AuthError::UsernameTaken))?;

        Self::update_profiles(&mut tx, user_id, changes).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_profiles(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        changes: &AccountChanges,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            UPDATE customers
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                email = COALESCE($4, email),
                address = COALESCE($5, address)
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(&changes.customer_name)
        .bind(&changes.customer_phone)
        .bind(&changes.customer_email)
        .bind(&changes.customer_address)
        .execute(&mut **tx)
        .await
        .map_err(map_customer_unique)?;

        sqlx::query(
            r#"
            UPDATE dealers
            SET dealer_name = COALESCE($2, dealer_name),
                address = COALESCE($3, address),
                quantity = COALESCE($4, quantity)
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(&changes.dealer_name)
        .bind(&changes.dealer_address)
        .bind(changes.dealer_quantity)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Returns false when the user does not exist or is already deleted
    pub async fn soft_delete(&self, user_id: i32) -> Result<bool, AuthError> {
        let result = sqlx::query("UPDATE users SET is_deleted = TRUE WHERE id = $1 AND is_deleted = FALSE")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_unique(error: sqlx::Error, conflict: AuthError) -> AuthError {
    if is_unique_violation(&error) {
        conflict
    } else {
        AuthError::DatabaseError(error)
    }
}

/// Phone and e-mail share a table; tell them apart by constraint name
fn map_customer_unique(error: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some(name) if name.contains("email") => AuthError::EmailTaken,
                _ => AuthError::PhoneTaken,
            };
        }
    }
    AuthError::DatabaseError(error)
}

#[derive(Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// SHA-256 hex digest; raw refresh tokens are never stored
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub async fn store_refresh_token(
        &self,
        user_id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query("INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(Self::hash_token(token))
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Stored, unexpired token row
    pub async fn find_valid(&self, token: &str) -> Result<Option<RefreshToken>, AuthError> {
        let row = sqlx::query_as::<_, RefreshToken>(
            "SELECT id, user_id, token_hash, expires_at, created_at
             FROM refresh_tokens
             WHERE token_hash = $1 AND expires_at > NOW()",
        )
        .bind(Self::hash_token(token))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Returns true when a token was removed
    pub async fn invalidate_token(&self, token: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(Self::hash_token(token))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn invalidate_all_for_user(&self, user_id: i32) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_expired_tokens(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
