use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{video, Video, VideoModel},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VideoKind {
    #[default]
    Video,
    Movie,
    Tvshow,
    Episode,
}

impl VideoKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoKind::Video => "video",
            VideoKind::Movie => "movie",
            VideoKind::Tvshow => "tvshow",
            VideoKind::Episode => "episode",
        }
    }
}

impl fmt::Display for VideoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(VideoKind::Video),
            "movie" => Ok(VideoKind::Movie),
            "tvshow" => Ok(VideoKind::Tvshow),
            "episode" => Ok(VideoKind::Episode),
            other => Err(AppError::Validation(format!("Invalid video kind '{other}'"))),
        }
    }
}

pub struct VideoService {
    db: DatabaseConnection,
}

impl VideoService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        created_by: i32,
        title: &str,
        description: Option<&str>,
        kind: VideoKind,
    ) -> AppResult<VideoModel> {
        let now = chrono::Utc::now().naive_utc();
        let model = video::ActiveModel {
            title: Set(title.trim().to_string()),
            description: Set(description.map(str::to_string)),
            kind: Set(kind.as_str().to_string()),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let video = model.insert(&self.db).await?;
        tracing::info!(video_id = video.id, created_by, kind = %kind, "video created");
        Ok(video)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<VideoModel> {
        Video::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn list(
        &self,
        kind: Option<VideoKind>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<VideoModel>, u64)> {
        let mut query = Video::find();
        if let Some(kind) = kind {
            query = query.filter(video::Column::Kind.eq(kind.as_str()));
        }

        let paginator = query
            .order_by_desc(video::Column::CreatedAt)
            .order_by_desc(video::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    pub async fn delete(&self, id: i32, caller: &AuthUser) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if !caller.can_manage(existing.created_by) {
            return Err(AppError::Forbidden);
        }
        Video::delete_by_id(id).exec(&self.db).await?;
        tracing::info!(video_id = id, by = caller.member_id, "video deleted");
        Ok(())
    }

    /// Owner used for like notifications. `None` when the video is gone.
    pub async fn owner_of(&self, id: i32) -> AppResult<Option<i32>> {
        let owner = Video::find_by_id(id)
            .select_only()
            .column(video::Column::CreatedBy)
            .into_tuple::<i32>()
            .one(&self.db)
            .await?;
        Ok(owner)
    }
}
