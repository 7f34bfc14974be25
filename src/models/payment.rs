use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Mpesa,
    Bank,
}

impl PaymentMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mpesa" => Some(PaymentMethod::Mpesa),
            "bank" => Some(PaymentMethod::Bank),
            _ => None,
        }
    }

    /// Required reference length: 10 alphanumerics for MPesa transaction
    /// codes, 14 for bank transfer references.
    pub fn reference_length(self) -> usize {
        match self {
            PaymentMethod::Mpesa => 10,
            PaymentMethod::Bank => 14,
        }
    }

    pub fn is_valid_reference(self, reference: &str) -> bool {
        reference.len() == self.reference_length()
            && reference.bytes().all(|b| b.is_ascii_alphanumeric())
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Mpesa => "MPesa",
            PaymentMethod::Bank => "Bank",
        }
    }
}

/// A payment starts out `paid` and is confirmed once by the supplier;
/// the confirm UPDATE guards on `status = 'paid'` so a repeat is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Confirmed,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct SupplierPayment {
    pub id: Uuid,
    pub request_id: Uuid,
    pub supplier_id: Uuid,
    pub total_cost: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_reference: String,
    pub status: PaymentStatus,
    pub paid_at: DateTime<Utc>,
}

/// A received request joined with its payment record, if any. Source of
/// the finance payment screen.
#[derive(Debug, Serialize, FromRow)]
pub struct ReceivedRequestDisplay {
    pub request_id: Uuid,
    pub item_id: Uuid,
    pub quantity_requested: i32,
    pub total_cost: Decimal,
    pub requested_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub supplier_id: Uuid,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpesa_reference_is_ten_alphanumerics() {
        assert!(PaymentMethod::Mpesa.is_valid_reference("AB12345678"));
        assert!(!PaymentMethod::Mpesa.is_valid_reference("AB1234567")); // 9
        assert!(!PaymentMethod::Mpesa.is_valid_reference("AB123456789")); // 11
        assert!(!PaymentMethod::Mpesa.is_valid_reference("AB12345-78"));
        assert!(!PaymentMethod::Mpesa.is_valid_reference(""));
    }

    #[test]
    fn bank_reference_is_fourteen_alphanumerics() {
        assert!(PaymentMethod::Bank.is_valid_reference("AB123456789012"));
        assert!(!PaymentMethod::Bank.is_valid_reference("AB12345678901")); // 13
        assert!(!PaymentMethod::Bank.is_valid_reference("AB123456 89012"));
    }

    #[test]
    fn non_ascii_references_are_rejected() {
        // ten chars, but not ascii alphanumeric
        assert!(!PaymentMethod::Mpesa.is_valid_reference("ABĆ1234567"));
    }

    #[test]
    fn parse_accepts_only_known_methods() {
        assert_eq!(PaymentMethod::parse("mpesa"), Some(PaymentMethod::Mpesa));
        assert_eq!(PaymentMethod::parse("bank"), Some(PaymentMethod::Bank));
        assert_eq!(PaymentMethod::parse("cash"), None);
        assert_eq!(PaymentMethod::parse("MPESA"), None);
    }
}
