use crate::{
    error::{AppError, AppResult},
    models::{review, Review, ReviewModel, Video},
    services::is_unique_violation,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

pub struct ReviewService {
    db: DatabaseConnection,
}

impl ReviewService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// One review per member per video; a second attempt is a conflict.
    pub async fn create(
        &self,
        video_id: i32,
        member_id: i32,
        rating: i16,
        content: Option<&str>,
    ) -> AppResult<ReviewModel> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::Validation(format!(
                "Rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        Video::find_by_id(video_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let now = chrono::Utc::now().naive_utc();
        let model = review::ActiveModel {
            video_id: Set(video_id),
            member_id: Set(member_id),
            rating: Set(rating),
            content: Set(content.map(str::to_string)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("You have already reviewed this video".to_string())
            } else {
                AppError::Database(e)
            }
        })
    }

    pub async fn list_for_video(
        &self,
        video_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReviewModel>, u64)> {
        let paginator = Review::find()
            .filter(review::Column::VideoId.eq(video_id))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Author used for like notifications. `None` when the review is gone.
    pub async fn owner_of(&self, id: i32) -> AppResult<Option<i32>> {
        let owner = Review::find_by_id(id)
            .select_only()
            .column(review::Column::MemberId)
            .into_tuple::<i32>()
            .one(&self.db)
            .await?;
        Ok(owner)
    }
}
