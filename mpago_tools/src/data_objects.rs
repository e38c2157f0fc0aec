use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The gateway's view of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Approved,
    Rejected,
    InProcess,
    Pending,
    Cancelled,
    Expired,
}

impl PaymentState {
    /// True once the gateway will never change its mind about this payment again.
    pub fn is_final(&self) -> bool {
        matches!(self, PaymentState::Approved | PaymentState::Rejected | PaymentState::Cancelled | PaymentState::Expired)
    }
}

impl Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentState::Approved => "approved",
            PaymentState::Rejected => "rejected",
            PaymentState::InProcess => "in_process",
            PaymentState::Pending => "pending",
            PaymentState::Cancelled => "cancelled",
            PaymentState::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

/// A freshly created PIX payment: the copy-paste code the customer pays with, and when it
/// stops working.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixPayment {
    pub id: String,
    pub status: PaymentState,
    pub pix_code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payer {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
}

impl Payer {
    pub fn new<S: Into<String>>(email: S) -> Self {
        Self { email: email.into(), first_name: None }
    }
}
