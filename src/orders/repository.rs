use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;

use crate::inventory::allocation::{plan_reduction, Reduction};
use crate::inventory::InventoryRepository;
use crate::orders::error::OrderError;
use crate::orders::{OrderRow, OrderScope, OrderStatus, OrderVehicleResponse};

const SELECT_ORDER: &str = "SELECT o.id, o.customer_id, o.dealer_id, o.order_date, o.total_amount, o.status, \
     cu.name AS customer_name, cu.phone AS customer_phone, cu.email AS customer_email, \
     cu.address AS customer_address, d.dealer_name, d.address AS dealer_address \
     FROM orders o \
     JOIN customers cu ON cu.id = o.customer_id \
     JOIN dealers d ON d.id = o.dealer_id";

/// Price and availability of a vehicle at order time
#[derive(Debug, Clone, FromRow)]
pub struct VehiclePrice {
    pub id: i32,
    pub price: Decimal,
    pub is_deleted: bool,
}

/// Stock taken from dealers for one vehicle when an order was paid
#[derive(Debug, Clone, serde::Serialize)]
pub struct StockMovement {
    pub vehicle_id: i32,
    pub reductions: Vec<Reduction>,
}

/// Repository for order operations
#[derive(Clone)]
pub struct OrdersRepository {
    pool: PgPool,
}

impl OrdersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn customer_exists(&self, customer_id: i32) -> Result<bool, OrderError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn dealer_exists(&self, dealer_id: i32) -> Result<bool, OrderError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM dealers WHERE id = $1)")
            .bind(dealer_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn vehicle_prices(&self, ids: &[i32]) -> Result<Vec<VehiclePrice>, OrderError> {
        let vehicles = sqlx::query_as::<_, VehiclePrice>(
            "SELECT id, price, is_deleted FROM vehicles WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    /// Insert the order and its lines in one transaction
    pub async fn create(
        &self,
        customer_id: i32,
        dealer_id: i32,
        total_amount: Decimal,
        lines: &[(i32, i32, Decimal)], // (vehicle_id, quantity, unit_price)
    ) -> Result<i32, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order_id: i32 = sqlx::query_scalar(
            "INSERT INTO orders (customer_id, dealer_id, order_date, total_amount, status) \
             VALUES ($1, $2, NOW() AT TIME ZONE 'UTC', $3, 'PENDING') RETURNING id",
        )
        .bind(customer_id)
        .bind(dealer_id)
        .bind(total_amount)
        .fetch_one(&mut *tx)
        .await?;

        for (vehicle_id, quantity, unit_price) in lines {
            sqlx::query(
                "INSERT INTO order_vehicles (order_id, vehicle_id, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(vehicle_id)
            .bind(quantity)
            .bind(unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order_id)
    }

    pub async fn find_row(&self, id: i32) -> Result<Option<OrderRow>, OrderError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{} WHERE o.id = $1", SELECT_ORDER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Newest first
    pub async fn list_rows(&self, scope: OrderScope) -> Result<Vec<OrderRow>, OrderError> {
        let query = match scope {
            OrderScope::All => format!("{} ORDER BY o.order_date DESC, o.id DESC", SELECT_ORDER),
            OrderScope::Customer(_) => format!(
                "{} WHERE o.customer_id = $1 ORDER BY o.order_date DESC, o.id DESC",
                SELECT_ORDER
            ),
            OrderScope::Dealer(_) => format!(
                "{} WHERE o.dealer_id = $1 OR EXISTS ( \
                    SELECT 1 FROM order_vehicles ov \
                    JOIN vehicle_dealers vd ON vd.vehicle_id = ov.vehicle_id \
                    WHERE ov.order_id = o.id AND vd.dealer_id = $1) \
                 ORDER BY o.order_date DESC, o.id DESC",
                SELECT_ORDER
            ),
        };

        let mut q = sqlx::query_as::<_, OrderRow>(&query);
        match scope {
            OrderScope::All => {}
            OrderScope::Customer(id) | OrderScope::Dealer(id) => q = q.bind(id),
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    /// Whether a dealer can see an order
    pub async fn dealer_can_see(&self, order_id: i32, dealer_id: i32) -> Result<bool, OrderError> {
        let visible: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM orders o WHERE o.id = $1 AND (o.dealer_id = $2 OR EXISTS ( \
                SELECT 1 FROM order_vehicles ov \
                JOIN vehicle_dealers vd ON vd.vehicle_id = ov.vehicle_id \
                WHERE ov.order_id = o.id AND vd.dealer_id = $2)))",
        )
        .bind(order_id)
        .bind(dealer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(visible)
    }

    /// Lines of several orders grouped by order id
    pub async fn lines_for(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderVehicleResponse>>, OrderError> {
        let lines = sqlx::query_as::<_, OrderVehicleResponse>(
            "SELECT ov.order_id, ov.vehicle_id, ov.quantity, ov.unit_price, \
                    v.model, v.color, v.version, v.image, c.name AS category_name \
             FROM order_vehicles ov \
             JOIN vehicles v ON v.id = ov.vehicle_id \
             JOIN vehicle_categories c ON c.id = v.category_id \
             WHERE ov.order_id = ANY($1) \
             ORDER BY ov.order_id, ov.id",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<OrderVehicleResponse>> = HashMap::new();
        for line in lines {
            grouped.entry(line.order_id).or_default().push(line);
        }
        Ok(grouped)
    }

    /// Move an order from `expected` to `next` under a row lock.
    ///
    /// Entering PAID also takes the ordered quantities out of dealer stock in
    /// the same transaction; any shortfall rolls everything back.
    pub async fn change_status(
        &self,
        order_id: i32,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Vec<StockMovement>, OrderError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(String, i32)> =
            sqlx::query_as("SELECT status, dealer_id FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (current, dealer_id) = locked.ok_or(OrderError::NotFound(order_id))?;
        if OrderStatus::parse(&current) != Some(expected) {
            return Err(OrderError::ConcurrentUpdate);
        }

        let mut movements = Vec::new();
        if next == OrderStatus::Paid {
            let lines: Vec<(i32, i32)> = sqlx::query_as(
                "SELECT vehicle_id, quantity FROM order_vehicles WHERE order_id = $1 ORDER BY id",
            )
            .bind(order_id)
            .fetch_all(&mut *tx)
            .await?;

            for (vehicle_id, quantity) in lines {
                let stock = InventoryRepository::lock_stock(&mut tx, vehicle_id).await?;
                let plan = plan_reduction(dealer_id, quantity, &stock).map_err(|shortfall| {
                    OrderError::InsufficientInventory {
                        vehicle_id,
                        required: shortfall.required,
                        available: shortfall.available,
                    }
                })?;
                InventoryRepository::apply_reductions(&mut tx, vehicle_id, &plan).await?;
                movements.push(StockMovement {
                    vehicle_id,
                    reductions: plan,
                });
            }
        }

        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(order_id)
            .bind(next.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(movements)
    }
}
