use sqlx::PgPool;

use crate::categories::Category;
use crate::error::ApiError;

#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Category>, ApiError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name FROM vehicle_categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Category>, ApiError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name FROM vehicle_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    /// Case-insensitive name check, optionally ignoring one category
    pub async fn name_exists(&self, name: &str, exclude_id: Option<i32>) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM vehicle_categories WHERE LOWER(name) = LOWER($1) AND ($2::INT IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// True when any vehicle, deleted or not, references the category
    pub async fn is_in_use(&self, id: i32) -> Result<bool, ApiError> {
        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE category_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(in_use)
    }

    pub async fn create(&self, name: &str) -> Result<Category, ApiError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO vehicle_categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    pub async fn update(&self, id: i32, name: &str) -> Result<Option<Category>, ApiError> {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE vehicle_categories SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    pub async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM vehicle_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
