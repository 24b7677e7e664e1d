use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Served as is by the inbox endpoints and pushed over the WebSocket feed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "notifications")]
#[schema(as = Notification)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub recipient_id: i32,
    pub sender_id: i32,
    /// like, comment or reply
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub kind: String,
    pub reference_id: i32,
    #[sea_orm(column_type = "String(StringLen::N(20))")]
    pub reference_type: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::RecipientId",
        to = "super::member::Column::Id"
    )]
    Recipient,
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::SenderId",
        to = "super::member::Column::Id"
    )]
    Sender,
}

impl ActiveModelBehavior for ActiveModel {}
