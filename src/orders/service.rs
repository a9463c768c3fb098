use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::auth::Actor;
use crate::inventory::InventoryRepository;
use crate::notifications::{Notifier, Resource};
use crate::orders::{
    CreateOrderRequest, OrderError, OrderResponse, OrderRow, OrderScope, OrderStatus,
    OrdersRepository, PriceCalculator, StatusMachine, StockMovement,
};

/// Units of one vehicle a dealer lost to a paid order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoldStock {
    pub order_id: i32,
    pub vehicle_id: i32,
    pub quantity: i32,
}

/// Service for order business logic
#[derive(Clone)]
pub struct OrderService {
    orders_repo: OrdersRepository,
    inventory_repo: InventoryRepository,
    notifier: Notifier,
}

impl OrderService {
    pub fn new(orders_repo: OrdersRepository, inventory_repo: InventoryRepository, notifier: Notifier) -> Self {
        Self {
            orders_repo,
            inventory_repo,
            notifier,
        }
    }

    /// Create a new order
    ///
    /// # Validation
    /// - Customer and dealer must exist
    /// - Every vehicle must exist and not be deleted
    /// - Unit prices are snapshotted from the current catalogue price
    /// - Without a dealer, the top stock holder of the first vehicle sells
    pub async fn create_order(
        &self,
        customer_id: i32,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, OrderError> {
        request.validate()?;

        if !self.orders_repo.customer_exists(customer_id).await? {
            return Err(OrderError::CustomerNotFound);
        }

        let vehicle_ids: Vec<i32> = request.items.iter().map(|item| item.vehicle_id).collect();
        let prices: HashMap<i32, (Decimal, bool)> = self
            .orders_repo
            .vehicle_prices(&vehicle_ids)
            .await?
            .into_iter()
            .map(|v| (v.id, (v.price, v.is_deleted)))
            .collect();

        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            match prices.get(&item.vehicle_id) {
                None => return Err(OrderError::VehicleNotFound(item.vehicle_id)),
                Some((_, true)) => return Err(OrderError::VehicleUnavailable(item.vehicle_id)),
                Some((price, false)) => lines.push((item.vehicle_id, item.quantity, *price)),
            }
        }

        let dealer_id = match request.dealer_id {
            Some(id) => {
                if !self.orders_repo.dealer_exists(id).await? {
                    return Err(OrderError::DealerNotFound);
                }
                id
            }
            None => {
                let first = lines[0].0;
                self.inventory_repo
                    .top_holder(first)
                    .await?
                    .ok_or(OrderError::OutOfStock(first))?
            }
        };

        let priced: Vec<(i32, Decimal)> = lines.iter().map(|(_, q, p)| (*q, *p)).collect();
        let total = PriceCalculator::order_total(&priced);

        let order_id = self
            .orders_repo
            .create(customer_id, dealer_id, total, &lines)
            .await?;
        info!(
            "Customer {} placed order {} with dealer {} for {}",
            customer_id, order_id, dealer_id, total
        );

        let order = self.load(order_id).await?;
        self.notifier
            .broadcast(Resource::Order, "created", order_id, Some(&order));
        Ok(order)
    }

    /// Orders visible to the caller, newest first
    pub async fn list(&self, actor: Actor) -> Result<Vec<OrderResponse>, OrderError> {
        let scope = match actor {
            Actor::Admin => OrderScope::All,
            Actor::Customer(id) => OrderScope::Customer(id),
            Actor::Dealer(id) => OrderScope::Dealer(id),
        };
        debug!("Listing orders for {:?}", scope);
        let rows = self.orders_repo.list_rows(scope).await?;
        self.attach_lines(rows).await
    }

    pub async fn get(&self, actor: Actor, id: i32) -> Result<OrderResponse, OrderError> {
        let order = self.load(id).await?;
        self.ensure_visible(actor, &order).await?;
        Ok(order)
    }

    /// Apply a status change requested by `actor`
    pub async fn update_status(
        &self,
        actor: Actor,
        id: i32,
        raw_status: &str,
    ) -> Result<OrderResponse, OrderError> {
        let target =
            OrderStatus::parse(raw_status).ok_or_else(|| OrderError::InvalidStatus(raw_status.to_string()))?;

        let order = self.load(id).await?;
        self.ensure_visible(actor, &order).await?;

        let owns_order = matches!(actor, Actor::Customer(cid) if cid == order.customer_id);
        StatusMachine::authorize(actor, owns_order, order.status, target)?;

        self.apply(order, target).await
    }

    /// Payment confirmed by the gateway; re-marking a paid order is a no-op
    pub async fn mark_paid(&self, id: i32) -> Result<OrderResponse, OrderError> {
        let order = self.load(id).await?;
        self.apply(order, OrderStatus::Paid).await
    }

    async fn apply(&self, order: OrderResponse, target: OrderStatus) -> Result<OrderResponse, OrderError> {
        if order.status == OrderStatus::Paid && target == OrderStatus::Paid {
            debug!("Order {} already paid", order.id);
            return Ok(order);
        }

        StatusMachine::transition(order.status, target).map_err(|err| {
            warn!("Rejected order {} transition {} -> {}", order.id, order.status, target);
            err
        })?;

        let movements = self
            .orders_repo
            .change_status(order.id, order.status, target)
            .await?;
        info!("Order {} {} -> {}", order.id, order.status, target);

        let updated = self.load(order.id).await?;
        self.notifier
            .broadcast(Resource::Order, "status_changed", updated.id, Some(&updated));
        for (dealer_id, sold) in sold_by_dealer(updated.id, &movements) {
            self.notifier
                .broadcast(Resource::Inventory, "reduced", dealer_id, Some(&sold));
        }
        Ok(updated)
    }

    async fn ensure_visible(&self, actor: Actor, order: &OrderResponse) -> Result<(), OrderError> {
        let visible = match actor {
            Actor::Admin => true,
            Actor::Customer(id) => order.customer_id == id,
            Actor::Dealer(id) => {
                order.dealer_id == id || self.orders_repo.dealer_can_see(order.id, id).await?
            }
        };
        if visible {
            Ok(())
        } else {
            Err(OrderError::Forbidden(
                "You do not have access to this order.".to_string(),
            ))
        }
    }

    async fn load(&self, id: i32) -> Result<OrderResponse, OrderError> {
        let row = self
            .orders_repo
            .find_row(id)
            .await?
            .ok_or(OrderError::NotFound(id))?;
        let mut lines = self.orders_repo.lines_for(&[id]).await?;
        Ok(OrderResponse::from_row(row, lines.remove(&id).unwrap_or_default()))
    }

    async fn attach_lines(&self, rows: Vec<OrderRow>) -> Result<Vec<OrderResponse>, OrderError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut lines = self.orders_repo.lines_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let vehicles = lines.remove(&row.id).unwrap_or_default();
                OrderResponse::from_row(row, vehicles)
            })
            .collect())
    }
}

/// Group stock movements by the dealer whose inventory shrank
pub fn sold_by_dealer(order_id: i32, movements: &[StockMovement]) -> BTreeMap<i32, Vec<SoldStock>> {
    let mut by_dealer: BTreeMap<i32, Vec<SoldStock>> = BTreeMap::new();
    for movement in movements {
        for reduction in &movement.reductions {
            by_dealer.entry(reduction.dealer_id).or_default().push(SoldStock {
                order_id,
                vehicle_id: movement.vehicle_id,
                quantity: reduction.quantity,
            });
        }
    }
    by_dealer
}
