use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{comment, Comment, CommentModel, Video},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

pub struct CommentService {
    db: DatabaseConnection,
}

/// A top-level comment with its direct replies, oldest first.
#[derive(Debug, Clone)]
pub struct CommentThread {
    pub comment: CommentModel,
    pub replies: Vec<CommentModel>,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_for_video(&self, video_id: i32) -> AppResult<Vec<CommentThread>> {
        let comments = Comment::find()
            .filter(comment::Column::VideoId.eq(video_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await?;
        Ok(build_threads(comments))
    }

    /// Create a comment, or a reply when `parent_id` is set. The parent must
    /// be a top-level comment on the same video.
    pub async fn create(
        &self,
        video_id: i32,
        member_id: i32,
        parent_id: Option<i32>,
        content: &str,
    ) -> AppResult<(CommentModel, Option<CommentModel>)> {
        Video::find_by_id(video_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let parent = match parent_id {
            Some(pid) => Some(self.validate_parent(pid, video_id).await?),
            None => None,
        };

        let now = chrono::Utc::now().naive_utc();
        let model = comment::ActiveModel {
            video_id: Set(video_id),
            member_id: Set(member_id),
            parent_id: Set(parent_id),
            content: Set(content.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let comment = model.insert(&self.db).await?;
        Ok((comment, parent))
    }

    pub async fn delete(&self, id: i32, caller: &AuthUser) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if !caller.can_manage(existing.member_id) {
            return Err(AppError::Forbidden);
        }
        Comment::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CommentModel> {
        Comment::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Author used for like notifications. `None` when the comment is gone.
    pub async fn owner_of(&self, id: i32) -> AppResult<Option<i32>> {
        let owner = Comment::find_by_id(id)
            .select_only()
            .column(comment::Column::MemberId)
            .into_tuple::<i32>()
            .one(&self.db)
            .await?;
        Ok(owner)
    }

    async fn validate_parent(&self, parent_id: i32, video_id: i32) -> AppResult<CommentModel> {
        let parent = Comment::find_by_id(parent_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation("Parent comment not found".to_string()))?;

        check_parent(&parent, video_id)?;
        Ok(parent)
    }
}

fn check_parent(parent: &CommentModel, video_id: i32) -> AppResult<()> {
    if parent.video_id != video_id {
        return Err(AppError::Validation(
            "Parent comment belongs to a different video".to_string(),
        ));
    }
    if parent.parent_id.is_some() {
        return Err(AppError::Validation(
            "Replies cannot be nested".to_string(),
        ));
    }
    Ok(())
}

/// Group a flat, chronologically ordered list into threads. Replies whose
/// parent is missing from the list are dropped.
fn build_threads(comments: Vec<CommentModel>) -> Vec<CommentThread> {
    let (roots, replies): (Vec<_>, Vec<_>) =
        comments.into_iter().partition(|c| c.parent_id.is_none());

    let mut threads: Vec<CommentThread> = roots
        .into_iter()
        .map(|comment| CommentThread {
            comment,
            replies: Vec::new(),
        })
        .collect();

    for reply in replies {
        if let Some(thread) = threads
            .iter_mut()
            .find(|t| Some(t.comment.id) == reply.parent_id)
        {
            thread.replies.push(reply);
        }
    }

    threads
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i32, video_id: i32, parent_id: Option<i32>) -> CommentModel {
        let now = chrono::Utc::now().naive_utc();
        CommentModel {
            id,
            video_id,
            member_id: 1,
            parent_id,
            content: format!("comment {id}"),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn replies_attach_to_their_root() {
        let threads = build_threads(vec![
            comment(1, 1, None),
            comment(2, 1, Some(1)),
            comment(3, 1, None),
            comment(4, 1, Some(1)),
        ]);
        assert_eq!(threads.len(), 2);
        let ids: Vec<i32> = threads[0].replies.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 4]);
        assert!(threads[1].replies.is_empty());
    }

    #[test]
    fn orphan_replies_are_dropped() {
        let threads = build_threads(vec![comment(2, 1, Some(99))]);
        assert!(threads.is_empty());
    }

    #[test]
    fn parent_on_other_video_is_rejected() {
        assert!(check_parent(&comment(1, 2, None), 1).is_err());
    }

    #[test]
    fn nested_reply_is_rejected() {
        assert!(check_parent(&comment(2, 1, Some(1)), 1).is_err());
        assert!(check_parent(&comment(1, 1, None), 1).is_ok());
    }
}
