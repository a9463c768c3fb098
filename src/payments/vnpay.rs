// VNPay request signing and return verification
//
// Parameters are sorted by key, URL-encoded with spaces as `+`, joined into
// a query string and signed with HMAC-SHA512 over that exact string.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::collections::{BTreeMap, HashMap};

use crate::config::VnPayConfig;

type HmacSha512 = Hmac<Sha512>;

pub const VERSION: &str = "2.1.0";
pub const SUCCESS_CODE: &str = "00";
const SECURE_HASH: &str = "vnp_SecureHash";
const SECURE_HASH_TYPE: &str = "vnp_SecureHashType";

/// What the gateway needs to start one payment
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub txn_ref: String,
    /// Smallest currency unit × 100, as VNPay expects
    pub amount: i64,
    pub order_info: String,
    pub client_ip: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct VnPayClient {
    config: VnPayConfig,
}

impl VnPayClient {
    pub fn new(config: VnPayConfig) -> Self {
        Self { config }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.tmn_code.is_empty() && !self.config.hash_secret.is_empty()
    }

    /// Signed redirect URL for the payment page
    pub fn payment_url(&self, request: &PaymentRequest) -> String {
        let created = gateway_time(request.created_at);
        let expires = gateway_time(request.created_at + Duration::minutes(15));

        let mut params = BTreeMap::new();
        params.insert("vnp_Version", VERSION.to_string());
        params.insert("vnp_Command", "pay".to_string());
        params.insert("vnp_TmnCode", self.config.tmn_code.clone());
        params.insert("vnp_Amount", request.amount.to_string());
        params.insert("vnp_CurrCode", "VND".to_string());
        params.insert("vnp_TxnRef", request.txn_ref.clone());
        params.insert("vnp_OrderInfo", request.order_info.clone());
        params.insert("vnp_OrderType", "other".to_string());
        params.insert("vnp_Locale", "vn".to_string());
        params.insert("vnp_ReturnUrl", self.config.return_url.clone());
        params.insert("vnp_IpAddr", request.client_ip.clone());
        params.insert("vnp_CreateDate", created);
        params.insert("vnp_ExpireDate", expires);

        let query = encode_params(params.iter().map(|(k, v)| (*k, v.as_str())));
        let signature = self.sign(&query);
        format!("{}?{}&{}={}", self.config.base_url, query, SECURE_HASH, signature)
    }

    /// Check the signature VNPay attached to a return or IPN call
    pub fn verify(&self, params: &HashMap<String, String>) -> bool {
        let Some(received) = params.get(SECURE_HASH) else {
            return false;
        };
        let signed: BTreeMap<&str, &str> = params
            .iter()
            .filter(|(k, v)| k.starts_with("vnp_") && *k != SECURE_HASH && *k != SECURE_HASH_TYPE && !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let data = encode_params(signed.into_iter());
        self.sign(&data).eq_ignore_ascii_case(received)
    }

    fn sign(&self, data: &str) -> String {
        hmac_sha512(&self.config.hash_secret, data)
    }
}

/// Lowercase hex HMAC-SHA512
pub fn hmac_sha512(key: &str, data: &str) -> String {
    // HMAC takes keys of any length, so construction cannot fail
    let mut mac = match HmacSha512::new_from_slice(key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(data.as_bytes());
    format!("{:x}", mac.finalize().into_bytes())
}

fn encode_params<'a>(params: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    params
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// VNPay timestamps are `yyyyMMddHHmmss` in GMT+7
fn gateway_time(at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(7 * 3600) {
        Some(offset) => at.with_timezone(&offset).format("%Y%m%d%H%M%S").to_string(),
        None => at.format("%Y%m%d%H%M%S").to_string(),
    }
}

/// Customer-facing text for a gateway response code
pub fn failure_reason(code: &str) -> String {
    match code {
        "07" => "Transaction expired".to_string(),
        "09" => "Customer cancelled transaction".to_string(),
        "10" => "Incorrect info entered".to_string(),
        "11" => "Transaction timeout".to_string(),
        "12" => "Account locked".to_string(),
        "24" => "Customer cancelled".to_string(),
        "51" => "Insufficient funds".to_string(),
        "65" => "Exceeded daily limit".to_string(),
        "75" => "Bank maintenance".to_string(),
        other => format!("Payment failed (Code: {})", other),
    }
}
