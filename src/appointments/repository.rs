use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;

use crate::appointments::{Appointment, AppointmentError, AppointmentStatus};
use crate::pagination::PageRequest;

const SELECT_APPOINTMENT: &str = "SELECT a.id, a.customer_id, cu.name AS customer_name, a.vehicle_id, \
     v.model AS vehicle_model, v.version AS vehicle_version, v.color AS vehicle_color, \
     a.appointment_date, a.status, a.created_at \
     FROM appointments a \
     JOIN customers cu ON cu.id = a.customer_id \
     JOIN vehicles v ON v.id = a.vehicle_id";

const FILTER_CLAUSE: &str = "WHERE ($1::INT IS NULL OR a.customer_id = $1) \
       AND ($2::TEXT IS NULL OR a.status = $2) \
       AND ($3::DATE IS NULL OR a.appointment_date >= $3) \
       AND ($4::DATE IS NULL OR a.appointment_date < $4 + 1) \
       AND ($5::TEXT IS NULL OR cu.name ILIKE $5)";

/// Normalized list criteria
#[derive(Debug, Default, Clone)]
pub struct AppointmentCriteria {
    pub customer_id: Option<i32>,
    pub status: Option<AppointmentStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub customer_name: Option<String>,
}

#[derive(Clone)]
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest appointment first
    pub async fn list(
        &self,
        criteria: &AppointmentCriteria,
        page: &PageRequest,
    ) -> Result<(Vec<Appointment>, i64), AppointmentError> {
        let name_pattern = criteria.customer_name.as_ref().map(|n| format!("%{}%", n));
        let status = criteria.status.map(|s| s.as_str());

        let items = sqlx::query_as::<_, Appointment>(&format!(
            "{} {} ORDER BY a.appointment_date DESC, a.id DESC LIMIT $6 OFFSET $7",
            SELECT_APPOINTMENT, FILTER_CLAUSE
        ))
        .bind(criteria.customer_id)
        .bind(status)
        .bind(criteria.start_date)
        .bind(criteria.end_date)
        .bind(name_pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM appointments a JOIN customers cu ON cu.id = a.customer_id {}",
            FILTER_CLAUSE
        ))
        .bind(criteria.customer_id)
        .bind(status)
        .bind(criteria.start_date)
        .bind(criteria.end_date)
        .bind(name_pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Appointment>, AppointmentError> {
        let appointment = sqlx::query_as::<_, Appointment>(&format!("{} WHERE a.id = $1", SELECT_APPOINTMENT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(appointment)
    }

    pub async fn customer_exists(&self, customer_id: i32) -> Result<bool, AppointmentError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn vehicle_available(&self, vehicle_id: i32) -> Result<bool, AppointmentError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE id = $1 AND is_deleted = FALSE)",
        )
        .bind(vehicle_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Any non-cancelled booking of the same customer, vehicle and time
    pub async fn slot_taken(
        &self,
        customer_id: i32,
        vehicle_id: i32,
        date: NaiveDateTime,
        exclude_id: Option<i32>,
    ) -> Result<bool, AppointmentError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM appointments \
             WHERE customer_id = $1 AND vehicle_id = $2 AND appointment_date = $3 \
               AND status <> 'CANCELLED' AND ($4::INT IS NULL OR id <> $4))",
        )
        .bind(customer_id)
        .bind(vehicle_id)
        .bind(date)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(
        &self,
        customer_id: i32,
        vehicle_id: i32,
        date: NaiveDateTime,
    ) -> Result<i32, AppointmentError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO appointments (customer_id, vehicle_id, appointment_date, status) \
             VALUES ($1, $2, $3, 'PENDING') RETURNING id",
        )
        .bind(customer_id)
        .bind(vehicle_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Only succeeds while the appointment is still in `expected`
    pub async fn reschedule(
        &self,
        id: i32,
        date: NaiveDateTime,
        expected: AppointmentStatus,
    ) -> Result<bool, AppointmentError> {
        let result = sqlx::query(
            "UPDATE appointments SET appointment_date = $2 WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(date)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Compare-and-set on the status column
    pub async fn update_status(
        &self,
        id: i32,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<bool, AppointmentError> {
        let result = sqlx::query("UPDATE appointments SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Expire stale appointments and return their ids
    pub async fn expire_stale(
        &self,
        now: NaiveDateTime,
        approved_cutoff: NaiveDateTime,
    ) -> Result<Vec<i32>, AppointmentError> {
        let ids = sqlx::query_scalar::<_, i32>(
            "UPDATE appointments SET status = 'EXPIRED' \
             WHERE (status = 'PENDING' AND appointment_date <= $1) \
                OR (status = 'APPROVE' AND appointment_date < $2) \
             RETURNING id",
        )
        .bind(now)
        .bind(approved_cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
