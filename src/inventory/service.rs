use tracing::{debug, info};
use validator::Validate;

use crate::auth::Actor;
use crate::error::ApiError;
use crate::inventory::{
    AddInventoryRequest, InventoryFilter, InventoryItem, InventoryRepository, UpdateInventoryRequest,
};
use crate::notifications::{Notifier, Resource};
use crate::validation::normalize_optional;

const ITEM_NOT_FOUND: &str = "Inventory item not found";

#[derive(Clone)]
pub struct InventoryService {
    repo: InventoryRepository,
    notifier: Notifier,
}

impl InventoryService {
    pub fn new(repo: InventoryRepository, notifier: Notifier) -> Self {
        Self { repo, notifier }
    }

    pub async fn list(&self, actor: Actor, filter: InventoryFilter) -> Result<Vec<InventoryItem>, ApiError> {
        let dealer_id = self.resolve_dealer(actor, filter.dealer_id).await?;
        let search = normalize_optional(filter.search);
        debug!("Listing inventory for dealer {}", dealer_id);
        self.repo
            .list_for_dealer(
                dealer_id,
                filter.category_id,
                search.as_deref(),
                filter.show_out_of_stock.unwrap_or(true),
            )
            .await
    }

    pub async fn get_item(
        &self,
        actor: Actor,
        vehicle_id: i32,
        requested_dealer: Option<i32>,
    ) -> Result<InventoryItem, ApiError> {
        let dealer_id = self.resolve_dealer(actor, requested_dealer).await?;
        self.repo
            .find_item(vehicle_id, dealer_id)
            .await?
            .ok_or_else(|| ApiError::bad_request(ITEM_NOT_FOUND))
    }

    /// Adds to existing stock or creates the row
    pub async fn add(&self, actor: Actor, request: AddInventoryRequest) -> Result<InventoryItem, ApiError> {
        request.validate()?;
        let dealer_id = self.resolve_dealer(actor, request.dealer_id).await?;
        if !self.repo.vehicle_available(request.vehicle_id).await? {
            return Err(ApiError::bad_request("Vehicle not found or deleted"));
        }

        self.repo
            .add_stock(request.vehicle_id, dealer_id, request.quantity)
            .await?;
        info!(
            "Dealer {} stock of vehicle {} increased by {}",
            dealer_id, request.vehicle_id, request.quantity
        );
        self.changed(dealer_id, request.vehicle_id).await
    }

    pub async fn update(
        &self,
        actor: Actor,
        vehicle_id: i32,
        request: UpdateInventoryRequest,
    ) -> Result<InventoryItem, ApiError> {
        request.validate()?;
        let dealer_id = self.resolve_dealer(actor, request.dealer_id).await?;
        if !self
            .repo
            .set_quantity(vehicle_id, dealer_id, request.quantity)
            .await?
        {
            return Err(ApiError::bad_request(ITEM_NOT_FOUND));
        }
        info!(
            "Dealer {} stock of vehicle {} set to {}",
            dealer_id, vehicle_id, request.quantity
        );
        self.changed(dealer_id, vehicle_id).await
    }

    /// Zeroes the quantity; the row stays
    pub async fn remove(&self, actor: Actor, vehicle_id: i32, requested_dealer: Option<i32>) -> Result<(), ApiError> {
        let dealer_id = self.resolve_dealer(actor, requested_dealer).await?;
        if !self.repo.set_quantity(vehicle_id, dealer_id, 0).await? {
            return Err(ApiError::bad_request(ITEM_NOT_FOUND));
        }
        info!("Dealer {} removed vehicle {} from inventory", dealer_id, vehicle_id);
        self.notifier.touch(Resource::Inventory, "removed", dealer_id);
        Ok(())
    }

    async fn changed(&self, dealer_id: i32, vehicle_id: i32) -> Result<InventoryItem, ApiError> {
        let item = self
            .repo
            .find_item(vehicle_id, dealer_id)
            .await?
            .ok_or_else(|| ApiError::bad_request(ITEM_NOT_FOUND))?;
        self.notifier
            .broadcast(Resource::Inventory, "updated", dealer_id, Some(&item));
        Ok(item)
    }

    /// Dealers always act on their own stock; admins name a dealer
    async fn resolve_dealer(&self, actor: Actor, requested: Option<i32>) -> Result<i32, ApiError> {
        let dealer_id = resolve_dealer_id(actor, requested)?;
        if matches!(actor, Actor::Admin) && !self.repo.dealer_exists(dealer_id).await? {
            return Err(ApiError::bad_request("Dealer not found"));
        }
        Ok(dealer_id)
    }
}

fn resolve_dealer_id(actor: Actor, requested: Option<i32>) -> Result<i32, ApiError> {
    match actor {
        Actor::Dealer(id) => Ok(id),
        Actor::Admin => requested.ok_or_else(|| ApiError::bad_request("dealer_id is required")),
        Actor::Customer(_) => Err(ApiError::Forbidden(
            "Only dealers and admins can manage inventory".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_dealer_ignores_requested_id() {
        assert_eq!(resolve_dealer_id(Actor::Dealer(4), Some(9)).unwrap(), 4);
    }

    #[test]
    fn test_admin_must_name_dealer() {
        assert_eq!(resolve_dealer_id(Actor::Admin, Some(9)).unwrap(), 9);
        let err = resolve_dealer_id(Actor::Admin, None).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_customer_is_forbidden() {
        let err = resolve_dealer_id(Actor::Customer(1), None).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
