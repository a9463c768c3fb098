use tracing::{info, warn};
use validator::Validate;

use crate::categories::{Category, CategoryRepository, CategoryRequest};
use crate::db::is_unique_violation;
use crate::error::ApiError;
use crate::notifications::{Notifier, Resource};

const DUPLICATE_NAME: &str = "A category with this name already exists";

#[derive(Clone)]
pub struct CategoryService {
    repo: CategoryRepository,
    notifier: Notifier,
}

impl CategoryService {
    pub fn new(repo: CategoryRepository, notifier: Notifier) -> Self {
        Self { repo, notifier }
    }

    pub async fn list(&self) -> Result<Vec<Category>, ApiError> {
        self.repo.list().await
    }

    pub async fn get(&self, id: i32) -> Result<Category, ApiError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category", id))
    }

    pub async fn create(&self, request: CategoryRequest) -> Result<Category, ApiError> {
        request.validate()?;
        let name = request.name.trim();

        if self.repo.name_exists(name, None).await? {
            warn!("Attempt to create duplicate category: {}", name);
            return Err(ApiError::conflict(DUPLICATE_NAME));
        }

        // The unique index still catches a concurrent insert of the same name
        let category = self.repo.create(name).await.map_err(duplicate_as_conflict)?;

        info!("Created category {} ({})", category.id, category.name);
        self.notifier
            .broadcast(Resource::Category, "created", category.id, Some(&category));
        Ok(category)
    }

    pub async fn update(&self, id: i32, request: CategoryRequest) -> Result<Category, ApiError> {
        request.validate()?;
        let name = request.name.trim();

        self.get(id).await?;
        if self.repo.name_exists(name, Some(id)).await? {
            warn!("Attempt to rename category {} to duplicate name: {}", id, name);
            return Err(ApiError::conflict(DUPLICATE_NAME));
        }

        let category = self
            .repo
            .update(id, name)
            .await
            .map_err(duplicate_as_conflict)?
            .ok_or_else(|| ApiError::not_found("Category", id))?;

        info!("Updated category {}", id);
        self.notifier
            .broadcast(Resource::Category, "updated", id, Some(&category));
        Ok(category)
    }

    pub async fn delete(&self, id: i32) -> Result<(), ApiError> {
        self.get(id).await?;
        if self.repo.is_in_use(id).await? {
            return Err(ApiError::conflict(
                "Cannot delete category because it is being used by one or more vehicles",
            ));
        }
        if !self.repo.delete(id).await? {
            return Err(ApiError::not_found("Category", id));
        }

        info!("Deleted category {}", id);
        self.notifier.touch(Resource::Category, "deleted", id);
        Ok(())
    }
}

fn duplicate_as_conflict(err: ApiError) -> ApiError {
    match err {
        ApiError::DatabaseError(db) if is_unique_violation(&db) => ApiError::conflict(DUPLICATE_NAME),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_other_errors_pass_through() {
        let err = duplicate_as_conflict(ApiError::bad_request("nope"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_row_not_found_is_not_a_conflict() {
        let err = duplicate_as_conflict(ApiError::DatabaseError(sqlx::Error::RowNotFound));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
