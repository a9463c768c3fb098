use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::payments::{PayableOrder, PaymentStatus, PaymentTransaction};

const SELECT_TRANSACTION: &str = "SELECT id, order_id, txn_ref, amount, status, response_code, bank_code, \
     gateway_transaction_no, created_at, updated_at FROM payment_transactions";

/// Gateway response fields stored with a finished transaction
#[derive(Debug, Clone, Default)]
pub struct GatewayOutcome {
    pub response_code: String,
    pub bank_code: Option<String>,
    pub transaction_no: Option<String>,
}

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_order(&self, order_id: i32) -> Result<Option<PayableOrder>, sqlx::Error> {
        sqlx::query_as::<_, PayableOrder>(
            "SELECT id, customer_id, total_amount, status FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn create(
        &self,
        order_id: i32,
        txn_ref: &str,
        amount: Decimal,
    ) -> Result<PaymentTransaction, sqlx::Error> {
        sqlx::query_as::<_, PaymentTransaction>(
            "INSERT INTO payment_transactions (order_id, txn_ref, amount, status) \
             VALUES ($1, $2, $3, 'PENDING') \
             RETURNING id, order_id, txn_ref, amount, status, response_code, bank_code, \
                       gateway_transaction_no, created_at, updated_at",
        )
        .bind(order_id)
        .bind(txn_ref)
        .bind(amount)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_txn_ref(&self, txn_ref: &str) -> Result<Option<PaymentTransaction>, sqlx::Error> {
        sqlx::query_as::<_, PaymentTransaction>(&format!("{} WHERE txn_ref = $1", SELECT_TRANSACTION))
            .bind(txn_ref)
            .fetch_optional(&self.pool)
            .await
    }

    /// Record the gateway result. Only a PENDING transaction is updated, so a
    /// replayed return cannot overwrite an earlier outcome.
    pub async fn finish(
        &self,
        txn_ref: &str,
        status: PaymentStatus,
        outcome: &GatewayOutcome,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE payment_transactions \
             SET status = $2, response_code = $3, bank_code = $4, gateway_transaction_no = $5, \
                 updated_at = NOW() \
             WHERE txn_ref = $1 AND status = 'PENDING'",
        )
        .bind(txn_ref)
        .bind(status.as_str())
        .bind(&outcome.response_code)
        .bind(&outcome.bank_code)
        .bind(&outcome.transaction_no)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
