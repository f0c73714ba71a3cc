use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Product catalog entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Product name
    pub name: String,

    /// Product description
    pub description: String,

    /// Sale price
    pub price: Decimal,

    /// Category label used for exact-match filtering
    pub category: String,

    /// Units on hand
    pub stock: i32,

    /// JSON array of hosted images (`[{url, public_id}, ...]`)
    pub images: Json,

    /// Live average of review ratings; 0.0 when the product has no reviews
    pub ratings: f64,

    /// Admin user that created the product
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// URL of the first hosted image, if any. The dashboard's top-seller
    /// table shows this thumbnail.
    pub fn first_image_url(&self) -> Option<String> {
        self.images
            .as_array()
            .and_then(|images| images.first())
            .and_then(|image| image.get("url"))
            .and_then(|url| url.as_str())
            .map(str::to_string)
    }
}
