use sqlx::{PgPool, Postgres, Transaction};

use crate::error::ApiError;
use crate::inventory::allocation::{DealerStock, Reduction};
use crate::inventory::InventoryItem;
use crate::query::contains_pattern;

const SELECT_ITEM: &str = "SELECT vd.vehicle_id, vd.dealer_id, vd.quantity, \
     v.model AS vehicle_model, v.color AS vehicle_color, v.version AS vehicle_version, \
     v.price AS vehicle_price, v.manufacture_date AS vehicle_manufacture_date, v.image AS vehicle_image, \
     v.category_id, c.name AS category_name, d.dealer_name, d.address AS dealer_address \
     FROM vehicle_dealers vd \
     JOIN vehicles v ON v.id = vd.vehicle_id \
     JOIN vehicle_categories c ON c.id = v.category_id \
     JOIN dealers d ON d.id = vd.dealer_id";

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_dealer(
        &self,
        dealer_id: i32,
        category_id: Option<i32>,
        search: Option<&str>,
        show_out_of_stock: bool,
    ) -> Result<Vec<InventoryItem>, ApiError> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            "{} WHERE vd.dealer_id = $1 \
               AND ($2::INT IS NULL OR v.category_id = $2) \
               AND ($3::TEXT IS NULL OR v.model ILIKE $3 OR v.color ILIKE $3 OR COALESCE(v.version, '') ILIKE $3) \
               AND ($4 OR vd.quantity > 0) \
             ORDER BY v.model, v.id",
            SELECT_ITEM
        ))
        .bind(dealer_id)
        .bind(category_id)
        .bind(search.map(contains_pattern))
        .bind(show_out_of_stock)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn find_item(&self, vehicle_id: i32, dealer_id: i32) -> Result<Option<InventoryItem>, ApiError> {
        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "{} WHERE vd.vehicle_id = $1 AND vd.dealer_id = $2",
            SELECT_ITEM
        ))
        .bind(vehicle_id)
        .bind(dealer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn dealer_exists(&self, dealer_id: i32) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM dealers WHERE id = $1)")
            .bind(dealer_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn vehicle_available(&self, vehicle_id: i32) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE id = $1 AND is_deleted = FALSE)",
        )
        .bind(vehicle_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Add units, creating the row on first stock
    pub async fn add_stock(&self, vehicle_id: i32, dealer_id: i32, quantity: i32) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO vehicle_dealers (vehicle_id, dealer_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (vehicle_id, dealer_id) DO UPDATE SET quantity = vehicle_dealers.quantity + EXCLUDED.quantity",
        )
        .bind(vehicle_id)
        .bind(dealer_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// False when no row exists
    pub async fn set_quantity(&self, vehicle_id: i32, dealer_id: i32, quantity: i32) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE vehicle_dealers SET quantity = $3 WHERE vehicle_id = $1 AND dealer_id = $2",
        )
        .bind(vehicle_id)
        .bind(dealer_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Dealer holding the most units of a vehicle, if anyone holds any
    pub async fn top_holder(&self, vehicle_id: i32) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "SELECT dealer_id FROM vehicle_dealers WHERE vehicle_id = $1 AND quantity > 0 \
             ORDER BY quantity DESC, dealer_id LIMIT 1",
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Every dealer's stock of a vehicle, row-locked until the transaction ends
    pub async fn lock_stock(
        tx: &mut Transaction<'_, Postgres>,
        vehicle_id: i32,
    ) -> Result<Vec<DealerStock>, sqlx::Error> {
        sqlx::query_as::<_, DealerStock>(
            "SELECT dealer_id, quantity FROM vehicle_dealers WHERE vehicle_id = $1 \
             ORDER BY dealer_id FOR UPDATE",
        )
        .bind(vehicle_id)
        .fetch_all(&mut **tx)
        .await
    }

    pub async fn apply_reductions(
        tx: &mut Transaction<'_, Postgres>,
        vehicle_id: i32,
        plan: &[Reduction],
    ) -> Result<(), sqlx::Error> {
        for reduction in plan {
            sqlx::query(
                "UPDATE vehicle_dealers SET quantity = quantity - $3 \
                 WHERE vehicle_id = $1 AND dealer_id = $2",
            )
            .bind(vehicle_id)
            .bind(reduction.dealer_id)
            .bind(reduction.quantity)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}
