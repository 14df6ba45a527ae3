use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Order lifecycle. `Pending` orders hold a stock reservation until they are
/// paid, cancelled, or expired; the fulfilment chain past `Paid` advances
/// only through the admin endpoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "preparing")]
    Preparing,
    #[sea_orm(string_value = "out_for_delivery")]
    OutForDelivery,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Expired => "expired",
        }
    }

    /// Transitions the admin endpoint may apply. Payment and expiration
    /// transitions go through their own handlers, never through here.
    pub fn admin_transition_allowed(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Paid, Preparing)
                | (Preparing, OutForDelivery)
                | (OutForDelivery, Delivered)
                | (Pending, Cancelled)
                | (Paid, Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Price in kobo.
    pub price: i64,
    pub category: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// Copy of the delivery address taken at checkout so later edits to the
/// saved address never alter a placed order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryAddress {
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub delivery_address: DeliveryAddress,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Total in kobo, delivery fee included.
    pub total_amount: i64,
    pub payment_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable snapshot of a product line at order-creation time.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    /// Unit price in kobo at the time the order was placed.
    pub product_price: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub provider: String,
    pub transaction_reference: String,
    /// Amount in kobo as reported by the gateway.
    pub amount: i64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn admin_transitions_follow_fulfilment_chain() {
        assert!(Paid.admin_transition_allowed(Preparing));
        assert!(Preparing.admin_transition_allowed(OutForDelivery));
        assert!(OutForDelivery.admin_transition_allowed(Delivered));
        assert!(Pending.admin_transition_allowed(Cancelled));
        assert!(Paid.admin_transition_allowed(Cancelled));
    }

    #[test]
    fn admin_cannot_mint_payment_or_expiry_states() {
        assert!(!Pending.admin_transition_allowed(Paid));
        assert!(!Pending.admin_transition_allowed(Expired));
        assert!(!Expired.admin_transition_allowed(Cancelled));
        assert!(!Delivered.admin_transition_allowed(Preparing));
        assert!(!Cancelled.admin_transition_allowed(Paid));
    }
}
