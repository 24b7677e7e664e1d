use crate::{
    error::{AppError, AppResult},
    models::{notification, Notification, NotificationModel},
    websocket::hub::NotificationHub,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

/// Notification kinds written by the content modules.
pub mod kind {
    pub const LIKE: &str = "like";
    pub const COMMENT: &str = "comment";
    pub const REPLY: &str = "reply";
}

pub struct NotificationService {
    db: DatabaseConnection,
    hub: NotificationHub,
}

impl NotificationService {
    pub fn new(db: DatabaseConnection, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    /// Persist a notification and push it to the recipient's live sockets.
    /// Returns `None` when sender and recipient are the same member.
    pub async fn notify(
        &self,
        recipient_id: i32,
        sender_id: i32,
        kind: &str,
        reference_type: &str,
        reference_id: i32,
        message: &str,
    ) -> AppResult<Option<NotificationModel>> {
        if recipient_id == sender_id {
            return Ok(None);
        }

        let model = notification::ActiveModel {
            recipient_id: Set(recipient_id),
            sender_id: Set(sender_id),
            kind: Set(kind.to_string()),
            reference_id: Set(reference_id),
            reference_type: Set(reference_type.to_string()),
            message: Set(message.to_string()),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        let saved = model.insert(&self.db).await?;
        tracing::debug!(
            recipient_id,
            sender_id,
            kind,
            reference_type,
            reference_id,
            "notification created"
        );

        self.hub.push(recipient_id, "notification", &saved);

        Ok(Some(saved))
    }

    pub async fn list_for_member(
        &self,
        member_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<NotificationModel>, u64)> {
        let paginator = Notification::find()
            .filter(notification::Column::RecipientId.eq(member_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    pub async fn unread_count(&self, member_id: i32) -> AppResult<u64> {
        let count = Notification::find()
            .filter(notification::Column::RecipientId.eq(member_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn mark_read(&self, id: i32, member_id: i32) -> AppResult<()> {
        let existing = Notification::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if existing.recipient_id != member_id {
            return Err(AppError::Forbidden);
        }
        if existing.is_read {
            return Ok(());
        }

        let mut active: notification::ActiveModel = existing.into();
        active.is_read = Set(true);
        active.update(&self.db).await?;
        Ok(())
    }

    pub async fn mark_all_read(&self, member_id: i32) -> AppResult<u64> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::RecipientId.eq(member_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
