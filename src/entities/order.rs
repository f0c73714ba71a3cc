use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const STATUS_PROCESSING: &str = "Processing";
pub const STATUS_SHIPPED: &str = "Shipped";
pub const STATUS_DELIVERED: &str = "Delivered";
pub const STATUS_CANCELLED: &str = "Cancelled";

/// All fulfilment statuses, in dashboard display order. The dashboard
/// zero-fills counts for statuses with no orders.
pub const ALL_STATUSES: [&str; 4] = [
    STATUS_PROCESSING,
    STATUS_SHIPPED,
    STATUS_DELIVERED,
    STATUS_CANCELLED,
];

pub const PAYMENT_PENDING: &str = "Pending";
pub const PAYMENT_PAID: &str = "Paid";
pub const PAYMENT_FAILED: &str = "Failed";

/// Customer order entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub buyer_id: Uuid,

    /// Fulfilment status: Processing, Shipped, Delivered or Cancelled
    pub order_status: String,

    pub total_price: Decimal,

    /// Payment status: Pending, Paid or Failed. Only Paid orders count
    /// towards review eligibility.
    pub payment_status: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::BuyerId",
        to = "super::user::Column::Id"
    )]
    Buyer,
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Buyer.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
