use sqlx::{postgres::PgArguments, query::QueryAs, query::QueryScalar, PgPool, Postgres};

use crate::error::ApiError;
use crate::query::{QueryParam, VehicleQueryBuilder};
use crate::vehicles::{Vehicle, VehicleRequest};

const SELECT_VEHICLE: &str = "SELECT v.id, v.category_id, c.name AS category_name, v.color, v.price, \
     v.manufacture_date, v.model, v.version, v.image, v.is_deleted \
     FROM vehicles v JOIN vehicle_categories c ON c.id = v.category_id";

#[derive(Clone)]
pub struct VehicleRepository {
    pool: PgPool,
}

fn bind_vehicle_params<'q>(
    mut query: QueryAs<'q, Postgres, Vehicle, PgArguments>,
    params: Vec<QueryParam>,
) -> QueryAs<'q, Postgres, Vehicle, PgArguments> {
    for param in params {
        query = match param {
            QueryParam::Text(value) => query.bind(value),
            QueryParam::Int(value) => query.bind(value),
            QueryParam::Decimal(value) => query.bind(value),
        };
    }
    query
}

fn bind_count_params<'q>(
    mut query: QueryScalar<'q, Postgres, i64, PgArguments>,
    params: Vec<QueryParam>,
) -> QueryScalar<'q, Postgres, i64, PgArguments> {
    for param in params {
        query = match param {
            QueryParam::Text(value) => query.bind(value),
            QueryParam::Int(value) => query.bind(value),
            QueryParam::Decimal(value) => query.bind(value),
        };
    }
    query
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of matches plus the total count
    pub async fn search(&self, builder: &VehicleQueryBuilder) -> Result<(Vec<Vehicle>, i64), ApiError> {
        let (query_str, params) = builder.build();
        let vehicles = bind_vehicle_params(sqlx::query_as::<_, Vehicle>(&query_str), params)
            .fetch_all(&self.pool)
            .await?;

        let (count_str, count_params) = builder.build_count();
        let total = bind_count_params(sqlx::query_scalar::<_, i64>(&count_str), count_params)
            .fetch_one(&self.pool)
            .await?;

        Ok((vehicles, total))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Vehicle>, ApiError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!("{} WHERE v.id = $1", SELECT_VEHICLE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    pub async fn list_by_category(&self, category_id: i32) -> Result<Vec<Vehicle>, ApiError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(&format!(
            "{} WHERE v.category_id = $1 AND v.is_deleted = FALSE ORDER BY v.model, v.id",
            SELECT_VEHICLE
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    pub async fn category_exists(&self, category_id: i32) -> Result<bool, ApiError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM vehicle_categories WHERE id = $1)")
                .bind(category_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Same model, version and color among non-deleted vehicles, case-insensitive
    pub async fn duplicate_exists(
        &self,
        request: &VehicleRequest,
        exclude_id: Option<i32>,
    ) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM vehicles \
             WHERE is_deleted = FALSE \
               AND LOWER(model) = LOWER($1) \
               AND LOWER(COALESCE(version, '')) = LOWER(COALESCE($2, '')) \
               AND LOWER(color) = LOWER($3) \
               AND ($4::INT IS NULL OR id <> $4))",
        )
        .bind(request.model.trim())
        .bind(request.version.as_deref())
        .bind(request.color.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Appointments in PENDING, APPROVE or RUNNING
    pub async fn has_active_appointments(&self, vehicle_id: i32) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM appointments \
             WHERE vehicle_id = $1 AND status IN ('PENDING', 'APPROVE', 'RUNNING'))",
        )
        .bind(vehicle_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(&self, request: &VehicleRequest) -> Result<Vehicle, ApiError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "WITH v AS ( \
                INSERT INTO vehicles (category_id, color, price, manufacture_date, model, version, image) \
                VALUES ($1, $2, $3, $4, $5, $6, $7) \
                RETURNING * \
             ) \
             SELECT v.id, v.category_id, c.name AS category_name, v.color, v.price, \
                    v.manufacture_date, v.model, v.version, v.image, v.is_deleted \
             FROM v JOIN vehicle_categories c ON c.id = v.category_id",
        )
        .bind(request.category_id)
        .bind(request.color.trim())
        .bind(request.price)
        .bind(request.manufacture_date)
        .bind(request.model.trim())
        .bind(request.version.as_deref())
        .bind(request.image.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(vehicle)
    }

    pub async fn update(&self, id: i32, request: &VehicleRequest) -> Result<Option<Vehicle>, ApiError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "WITH v AS ( \
                UPDATE vehicles SET category_id = $2, color = $3, price = $4, \
                    manufacture_date = $5, model = $6, version = $7, image = $8 \
                WHERE id = $1 \
                RETURNING * \
             ) \
             SELECT v.id, v.category_id, c.name AS category_name, v.color, v.price, \
                    v.manufacture_date, v.model, v.version, v.image, v.is_deleted \
             FROM v JOIN vehicle_categories c ON c.id = v.category_id",
        )
        .bind(id)
        .bind(request.category_id)
        .bind(request.color.trim())
        .bind(request.price)
        .bind(request.manufacture_date)
        .bind(request.model.trim())
        .bind(request.version.as_deref())
        .bind(request.image.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(vehicle)
    }

    /// Flip the deleted flag; false when the vehicle was already in that state
    pub async fn set_deleted(&self, id: i32, deleted: bool) -> Result<bool, ApiError> {
        let result = sqlx::query("UPDATE vehicles SET is_deleted = $2 WHERE id = $1 AND is_deleted <> $2")
            .bind(id)
            .bind(deleted)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
