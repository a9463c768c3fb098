use chrono::Utc;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::notifications::{Notifier, Resource};
use crate::orders::{OrderService, OrderStatus, PriceCalculator};
use crate::payments::vnpay::{self, PaymentRequest, VnPayClient};
use crate::payments::{
    GatewayOutcome, PaymentError, PaymentRepository, PaymentResult, PaymentStatus,
    PaymentTransaction, PaymentUrlResponse,
};

#[derive(Clone)]
pub struct PaymentService {
    repo: PaymentRepository,
    orders: OrderService,
    client: VnPayClient,
    notifier: Notifier,
}

impl PaymentService {
    pub fn new(repo: PaymentRepository, orders: OrderService, client: VnPayClient, notifier: Notifier) -> Self {
        Self {
            repo,
            orders,
            client,
            notifier,
        }
    }

    /// Record a PENDING transaction and return the signed gateway URL.
    ///
    /// The order must belong to `customer_id` and be APPROVE.
    pub async fn create_payment_url(
        &self,
        customer_id: i32,
        order_id: i32,
        client_ip: &str,
    ) -> Result<PaymentUrlResponse, PaymentError> {
        if !self.client.is_configured() {
            return Err(PaymentError::NotConfigured);
        }

        let order = self
            .repo
            .find_order(order_id)
            .await?
            .ok_or(PaymentError::OrderNotFound(order_id))?;
        if order.customer_id != customer_id {
            return Err(PaymentError::NotOwner);
        }
        if OrderStatus::parse(&order.status) != Some(OrderStatus::Approve) {
            return Err(PaymentError::NotPayable(order.status));
        }

        let amount = PriceCalculator::gateway_amount(order.total_amount)
            .filter(|amount| *amount > 0)
            .ok_or(PaymentError::InvalidAmount)?;
        let txn_ref = new_txn_ref(order_id);

        let transaction = self.repo.create(order_id, &txn_ref, order.total_amount).await?;
        let url = self.client.payment_url(&PaymentRequest {
            txn_ref: txn_ref.clone(),
            amount,
            order_info: format!("{} Payment for order {}", order_id, order_id),
            client_ip: client_ip.to_string(),
            created_at: Utc::now(),
        });
        info!("Customer {} started payment {} for order {}", customer_id, txn_ref, order_id);

        self.notifier
            .broadcast(Resource::Payment, "created", transaction.id, Some(&transaction));
        Ok(PaymentUrlResponse {
            order_id,
            txn_ref,
            amount: order.total_amount,
            payment_url: url,
        })
    }

    /// Process the gateway redirect back to the shop
    pub async fn handle_return(&self, params: &HashMap<String, String>) -> Result<PaymentResult, PaymentError> {
        if !self.client.verify(params) {
            warn!("Rejected VNPay return with invalid signature");
            return Err(PaymentError::InvalidSignature);
        }

        let txn_ref = param(params, "vnp_TxnRef")?;
        let transaction = self
            .repo
            .find_by_txn_ref(txn_ref)
            .await?
            .ok_or(PaymentError::TransactionNotFound)?;

        let paid: i64 = param(params, "vnp_Amount")?
            .parse()
            .map_err(|_| PaymentError::AmountMismatch)?;
        if PriceCalculator::gateway_amount(transaction.amount) != Some(paid) {
            warn!("Amount mismatch for {}: got {}", txn_ref, paid);
            return Err(PaymentError::AmountMismatch);
        }

        let outcome = GatewayOutcome {
            response_code: param(params, "vnp_ResponseCode")?.to_string(),
            bank_code: params.get("vnp_BankCode").cloned(),
            transaction_no: params.get("vnp_TransactionNo").cloned(),
        };

        if transaction.status != PaymentStatus::Pending {
            info!("Payment {} already processed as {:?}", txn_ref, transaction.status);
            return Ok(stored_result(&transaction));
        }

        if outcome.response_code != vnpay::SUCCESS_CODE {
            let reason = vnpay::failure_reason(&outcome.response_code);
            self.finish(&transaction, PaymentStatus::Failed, &outcome).await?;
            info!("Payment {} failed: {}", txn_ref, reason);
            return Ok(result(&transaction, &outcome, false, reason));
        }

        if let Err(err) = self.orders.mark_paid(transaction.order_id).await {
            warn!("Payment {} succeeded but order {} was not marked paid: {}", txn_ref, transaction.order_id, err);
            self.finish(&transaction, PaymentStatus::Failed, &outcome).await?;
            return Err(err.into());
        }
        self.finish(&transaction, PaymentStatus::Success, &outcome).await?;
        info!("Payment {} succeeded for order {}", txn_ref, transaction.order_id);

        Ok(result(
            &transaction,
            &outcome,
            true,
            "Payment successful. Your order has been paid.".to_string(),
        ))
    }

    async fn finish(
        &self,
        transaction: &PaymentTransaction,
        status: PaymentStatus,
        outcome: &GatewayOutcome,
    ) -> Result<(), PaymentError> {
        if self.repo.finish(&transaction.txn_ref, status, outcome).await? {
            self.notifier
                .touch(Resource::Payment, status.as_str(), transaction.id);
        }
        Ok(())
    }
}

fn param<'a>(params: &'a HashMap<String, String>, key: &'static str) -> Result<&'a str, PaymentError> {
    params
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or(PaymentError::MissingParameter(key))
}

/// Order id first so the reference stays readable in gateway reports
fn new_txn_ref(order_id: i32) -> String {
    format!("{}-{}", order_id, Uuid::new_v4().simple())
}

fn result(transaction: &PaymentTransaction, outcome: &GatewayOutcome, success: bool, message: String) -> PaymentResult {
    PaymentResult {
        success,
        order_id: transaction.order_id,
        txn_ref: transaction.txn_ref.clone(),
        amount: transaction.amount,
        response_code: outcome.response_code.clone(),
        transaction_no: outcome.transaction_no.clone(),
        bank_code: outcome.bank_code.clone(),
        message,
    }
}

fn stored_result(transaction: &PaymentTransaction) -> PaymentResult {
    let success = transaction.status == PaymentStatus::Success;
    let code = transaction.response_code.clone().unwrap_or_default();
    let message = if success {
        "Payment already confirmed.".to_string()
    } else {
        vnpay::failure_reason(&code)
    };
    PaymentResult {
        success,
        order_id: transaction.order_id,
        txn_ref: transaction.txn_ref.clone(),
        amount: transaction.amount,
        response_code: code,
        transaction_no: transaction.gateway_transaction_no.clone(),
        bank_code: transaction.bank_code.clone(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn transaction(status: PaymentStatus, code: Option<&str>) -> PaymentTransaction {
        PaymentTransaction {
            id: 1,
            order_id: 7,
            txn_ref: "7-abc".into(),
            amount: dec!(1500000),
            status,
            response_code: code.map(str::to_string),
            bank_code: Some("NCB".into()),
            gateway_transaction_no: Some("14000001".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_txn_ref_starts_with_order_and_is_unique() {
        let a = new_txn_ref(12);
        let b = new_txn_ref(12);
        assert!(a.starts_with("12-"));
        assert_ne!(a, b);
        assert!(a.len() <= 64);
    }

    #[test]
    fn test_param_rejects_missing_and_empty() {
        let mut params = HashMap::new();
        params.insert("vnp_TxnRef".to_string(), String::new());
        assert!(matches!(
            param(&params, "vnp_TxnRef"),
            Err(PaymentError::MissingParameter("vnp_TxnRef"))
        ));
        assert!(param(&params, "vnp_Amount").is_err());
        params.insert("vnp_TxnRef".to_string(), "7-abc".to_string());
        assert_eq!(param(&params, "vnp_TxnRef").unwrap(), "7-abc");
    }

    #[test]
    fn test_stored_result_for_replayed_success() {
        let result = stored_result(&transaction(PaymentStatus::Success, Some("00")));
        assert!(result.success);
        assert_eq!(result.order_id, 7);
        assert_eq!(result.transaction_no.as_deref(), Some("14000001"));
    }

    #[test]
    fn test_stored_result_for_replayed_failure_explains_code() {
        let result = stored_result(&transaction(PaymentStatus::Failed, Some("51")));
        assert!(!result.success);
        assert_eq!(result.message, "Insufficient funds");
    }
}
