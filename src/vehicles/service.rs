use tracing::{debug, info, warn};
use validator::Validate;

use crate::error::ApiError;
use crate::notifications::{Notifier, Resource};
use crate::pagination::PagedResult;
use crate::query::{QueryValidator, VehicleQuery};
use crate::vehicles::{Vehicle, VehicleRepository, VehicleRequest};

const DUPLICATE_VEHICLE: &str = "A vehicle with the same model, version, and color already exists";

#[derive(Clone)]
pub struct VehicleService {
    repo: VehicleRepository,
    notifier: Notifier,
}

impl VehicleService {
    pub fn new(repo: VehicleRepository, notifier: Notifier) -> Self {
        Self { repo, notifier }
    }

    /// Public catalogue listing; `is_admin` unlocks `include_deleted`
    pub async fn browse(&self, query: VehicleQuery, is_admin: bool) -> Result<PagedResult<Vehicle>, ApiError> {
        let validated = QueryValidator::validate(query, is_admin)?;
        debug!("Browsing vehicles: {:?}", validated);
        let (vehicles, total) = self.repo.search(&validated.to_builder()).await?;
        Ok(PagedResult::new(vehicles, total, &validated.page))
    }

    pub async fn get(&self, id: i32) -> Result<Vehicle, ApiError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Vehicle", id))
    }

    pub async fn list_by_category(&self, category_id: i32) -> Result<Vec<Vehicle>, ApiError> {
        if !self.repo.category_exists(category_id).await? {
            return Err(ApiError::not_found("Category", category_id));
        }
        self.repo.list_by_category(category_id).await
    }

    pub async fn create(&self, request: VehicleRequest) -> Result<Vehicle, ApiError> {
        let request = normalize(request);
        self.check_request(&request, None).await?;

        let vehicle = self.repo.create(&request).await?;
        info!("Created vehicle {} ({} {})", vehicle.id, vehicle.model, vehicle.color);
        self.notifier
            .broadcast(Resource::Vehicle, "created", vehicle.id, Some(&vehicle));
        Ok(vehicle)
    }

    pub async fn update(&self, id: i32, request: VehicleRequest) -> Result<Vehicle, ApiError> {
        let request = normalize(request);
        self.get(id).await?;
        self.check_request(&request, Some(id)).await?;

        let vehicle = self
            .repo
            .update(id, &request)
            .await?
            .ok_or_else(|| ApiError::not_found("Vehicle", id))?;
        info!("Updated vehicle {}", id);
        self.notifier
            .broadcast(Resource::Vehicle, "updated", id, Some(&vehicle));
        Ok(vehicle)
    }

    pub async fn soft_delete(&self, id: i32) -> Result<(), ApiError> {
        let vehicle = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::bad_request("Vehicle not found"))?;
        if vehicle.is_deleted {
            return Err(ApiError::bad_request("Vehicle is already deleted"));
        }
        if self.repo.has_active_appointments(id).await? {
            warn!("Refused to delete vehicle {} with active appointments", id);
            return Err(ApiError::conflict(
                "Cannot delete vehicle because it has active appointments",
            ));
        }

        self.repo.set_deleted(id, true).await?;
        info!("Soft-deleted vehicle {}", id);
        self.notifier.touch(Resource::Vehicle, "deleted", id);
        Ok(())
    }

    pub async fn restore(&self, id: i32) -> Result<Vehicle, ApiError> {
        let vehicle = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::bad_request("Vehicle not found"))?;
        if !vehicle.is_deleted {
            return Err(ApiError::bad_request("Vehicle is not deleted"));
        }
        if self.repo.duplicate_exists(&as_request(&vehicle), Some(id)).await? {
            return Err(ApiError::conflict(DUPLICATE_VEHICLE));
        }

        self.repo.set_deleted(id, false).await?;
        info!("Restored vehicle {}", id);
        let restored = self.get(id).await?;
        self.notifier
            .broadcast(Resource::Vehicle, "restored", id, Some(&restored));
        Ok(restored)
    }

    async fn check_request(&self, request: &VehicleRequest, exclude_id: Option<i32>) -> Result<(), ApiError> {
        request.validate()?;
        if !self.repo.category_exists(request.category_id).await? {
            return Err(ApiError::bad_request("Invalid category ID"));
        }
        if self.repo.duplicate_exists(request, exclude_id).await? {
            warn!("Duplicate vehicle rejected: {} {:?} {}", request.model, request.version, request.color);
            return Err(ApiError::conflict(DUPLICATE_VEHICLE));
        }
        Ok(())
    }
}

/// Trim text fields; blank optional fields become NULL
fn normalize(request: VehicleRequest) -> VehicleRequest {
    VehicleRequest {
        color: request.color.trim().to_string(),
        model: request.model.trim().to_string(),
        version: crate::validation::normalize_optional(request.version),
        image: crate::validation::normalize_optional(request.image),
        ..request
    }
}

fn as_request(vehicle: &Vehicle) -> VehicleRequest {
    VehicleRequest {
        category_id: vehicle.category_id,
        color: vehicle.color.clone(),
        price: vehicle.price,
        manufacture_date: vehicle.manufacture_date,
        model: vehicle.model.clone(),
        version: vehicle.version.clone(),
        image: vehicle.image.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_trims_and_drops_blank_optionals() {
        let request = VehicleRequest {
            category_id: 1,
            color: "  Blue ".into(),
            price: dec!(1000),
            manufacture_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            model: " VF 5 ".into(),
            version: Some("   ".into()),
            image: Some(" https://cdn/x.png ".into()),
        };
        let normalized = normalize(request);
        assert_eq!(normalized.color, "Blue");
        assert_eq!(normalized.model, "VF 5");
        assert_eq!(normalized.version, None);
        assert_eq!(normalized.image.as_deref(), Some("https://cdn/x.png"));
    }
}
