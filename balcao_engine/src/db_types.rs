use std::{fmt::Display, str::FromStr};

use balcao_common::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        -------------------------------------------------------
/// The opaque, unique identifier of an order. Orders also carry a human-facing sequential
/// `order_number`, but every API call addresses orders by this id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A fresh opaque id for a new order.
    pub fn random() -> Self {
        use rand::{distributions::Alphanumeric, Rng};
        let suffix: String = rand::thread_rng().sample_iter(&Alphanumeric).take(12).map(char::from).collect();
        Self(format!("ord-{}", suffix.to_lowercase()))
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
/// The order lifecycle. The legal transitions between these states are defined in
/// [`crate::status`]; nothing outside the pipeline may move an order between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// Staff-created order awaiting a decision on how payment will be collected.
    Pending,
    /// Customer-created order awaiting payment before preparation starts.
    PendingPayment,
    /// Payment received; used when the kitchen has not yet picked the order up.
    Paid,
    /// The kitchen is preparing the order.
    InPreparation,
    /// The order is ready for pickup.
    Ready,
    /// The order was handed over. Terminal.
    Completed,
    /// The order was cancelled. Terminal.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::PendingPayment => "pending_payment",
            OrderStatusType::Paid => "paid",
            OrderStatusType::InPreparation => "in_preparation",
            OrderStatusType::Ready => "ready",
            OrderStatusType::Completed => "completed",
            OrderStatusType::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "pending_payment" => Ok(Self::PendingPayment),
            "paid" => Ok(Self::Paid),
            "in_preparation" => Ok(Self::InPreparation),
            "ready" => Ok(Self::Ready),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//-------------------------------------   PaymentStatusType    -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatusType {
    Pending,
    Confirmed,
}

impl Display for PaymentStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatusType::Pending => write!(f, "pending"),
            PaymentStatusType::Confirmed => write!(f, "confirmed"),
        }
    }
}

//--------------------------------------    PaymentMethod      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    Card,
    Cash,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Pix => write!(f, "pix"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Cash => write!(f, "cash"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pix" => Ok(Self::Pix),
            "card" => Ok(Self::Card),
            "cash" => Ok(Self::Cash),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//------------------------------------   ConfirmationSource    -------------------------------------------------------
/// The path through which a payment confirmation reached the coordinator. Three callers fan in
/// to the same entry point; the source tag exists purely for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationSource {
    /// A staff member confirmed the payment by hand.
    Manual,
    /// The payment gateway delivered a webhook.
    Webhook,
    /// The client-side status poller observed an approved payment.
    Gateway,
}

impl Display for ConfirmationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfirmationSource::Manual => write!(f, "manual"),
            ConfirmationSource::Webhook => write!(f, "webhook"),
            ConfirmationSource::Gateway => write!(f, "gateway"),
        }
    }
}

//------------------------------------    NotificationType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    OrderCreated,
    PaymentConfirmed,
    OrderReady,
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::OrderCreated => write!(f, "order_created"),
            NotificationType::PaymentConfirmed => write!(f, "payment_confirmed"),
            NotificationType::OrderReady => write!(f, "order_ready"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

//------------------------------------   ConfirmationEvent     -------------------------------------------------------
/// The kind of audit entry written by the confirmation coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationEvent {
    PaymentConfirmed,
    PaymentConfirmationFailed,
    DuplicateConfirmationAttempt,
    NotificationSkipped,
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub order_number: i64,
    pub customer_name: String,
    /// Channel address for customer messaging. Orders without one skip notifications.
    pub customer_phone: Option<String>,
    pub total_amount: Money,
    /// Always `total_amount.commission()`. Every writer recomputes this from the total it is
    /// itself setting; it is never derived from a previously read row.
    pub commission_amount: Money,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatusType,
    pub payment_method: Option<PaymentMethod>,
    pub waiter_id: Option<String>,
    pub staff_assisted: bool,
    pub pix_code: Option<String>,
    pub pix_generated_at: Option<DateTime<Utc>>,
    pub pix_expires_at: Option<DateTime<Utc>>,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub payment_confirmed_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    /// True if the order holds an instant-payment code that has not yet expired.
    /// A code without an expiry timestamp is never considered valid.
    pub fn has_valid_pix_code(&self, now: DateTime<Utc>) -> bool {
        self.pix_code.is_some() && self.pix_expires_at.map(|t| t > now).unwrap_or(false)
    }
}

//--------------------------------------      NewOrder        --------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    /// Staff member placing the order on behalf of a customer, if any.
    pub waiter_id: Option<String>,
    pub staff_assisted: bool,
}

impl NewOrder {
    pub fn new(order_id: OrderId, customer_name: String) -> Self {
        Self { order_id, customer_name, customer_phone: None, waiter_id: None, staff_assisted: false }
    }

    pub fn with_phone(mut self, phone: String) -> Self {
        self.customer_phone = Some(phone);
        self
    }

    /// Marks the order as staff-assisted: it enters preparation immediately and payment is
    /// collected asynchronously.
    pub fn with_waiter(mut self, waiter_id: String) -> Self {
        self.waiter_id = Some(waiter_id);
        self.staff_assisted = true;
        self
    }
}

//--------------------------------------     OrderItem        --------------------------------------------------------
/// A line item. `name` and `unit_price` are snapshotted from the catalog when the row is
/// created and are immune to later catalog changes. Rows are never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub menu_item_id: i64,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A priced line item ready for insertion; produced by resolving an [`ItemSelection`](crate::order_objects::ItemSelection)
/// against the catalog.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub menu_item_id: i64,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub notes: Option<String>,
}

impl NewOrderItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------     MenuItem        ---------------------------------------------------------
/// A catalog row. The catalog itself is managed elsewhere; the pipeline only reads it to
/// snapshot prices and check availability.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub available: bool,
}

//-----------------------------------   NotificationRecord    --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub order_id: OrderId,
    pub event: NotificationType,
    pub status: NotificationStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

//-----------------------------------   ConfirmationLogEntry   -------------------------------------------------------
/// Append-only audit record, one per confirmation attempt (successful or not).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ConfirmationLogEntry {
    pub id: i64,
    pub order_id: OrderId,
    pub event: ConfirmationEvent,
    pub source: ConfirmationSource,
    pub payment_method: Option<PaymentMethod>,
    pub gateway_payment_id: Option<String>,
    pub notification_sent: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewConfirmationLogEntry {
    pub order_id: OrderId,
    pub event: ConfirmationEvent,
    pub source: ConfirmationSource,
    pub payment_method: Option<PaymentMethod>,
    pub gateway_payment_id: Option<String>,
    pub notification_sent: bool,
    pub error: Option<String>,
}

//--------------------------------------    PixArtifact       --------------------------------------------------------
/// A freshly issued instant-payment code, as returned by the payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixArtifact {
    pub code: String,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub gateway_payment_id: String,
}
