use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Role granted to regular shoppers.
pub const ROLE_USER: &str = "User";
/// Role granted to dashboard administrators.
pub const ROLE_ADMIN: &str = "Admin";

/// User account entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Login email, unique across accounts
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 password hash, never serialized to clients
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Either "User" or "Admin"
    pub role: String,

    /// Hosted avatar reference (`{url, public_id}`)
    pub avatar: Option<Json>,

    /// SHA-256 hex digest of the outstanding reset token
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,

    /// Expiry of the outstanding reset token
    #[serde(skip_serializing)]
    pub reset_password_expires: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
