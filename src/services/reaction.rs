//! Like/dislike toggling.
//!
//! Every `(user_id, target_id, target_type)` tuple is in one of three states.
//! Storage keeps at most one `reactions` row per tuple: no row is
//! [`ReactionState::Neutral`], `is_like = true` is [`ReactionState::Liked`]
//! and `is_like = false` is [`ReactionState::Disliked`]. Code outside this
//! module reasons about [`ReactionState`]; only [`ReactionState::from_row`]
//! looks at row presence.
//!
//! ```text
//! NEUTRAL  --like-->    LIKED     (notify owner)
//! NEUTRAL  --dislike--> DISLIKED
//! LIKED    --like-->    NEUTRAL   (row deleted)
//! LIKED    --dislike--> DISLIKED
//! DISLIKED --dislike--> NEUTRAL   (row deleted)
//! DISLIKED --like-->    LIKED     (notify owner)
//! ```
//!
//! The decision is made from a plain read, so two concurrent toggles on the
//! same tuple may both act on a stale state. The upsert is keyed on the
//! unique index and never fails with a duplicate key; the last write wins.
//!
//! Cached counts live under a per-target generation. A toggle bumps the
//! generation after its write, which retires anything a concurrent
//! [`ReactionService::counts`] computed before that write.

use crate::{
    error::{AppError, AppResult},
    models::{reaction, Reaction, ReactionModel},
    services::{
        cache::CacheService,
        comment::CommentService,
        notification::{kind, NotificationService},
        review::ReviewService,
        video::VideoService,
    },
    websocket::hub::NotificationHub,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter, QuerySelect, Statement,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

const COUNT_CACHE_TTL_SECS: u64 = 60;

const UPSERT_SQL: &str = "INSERT INTO reactions (user_id, target_id, target_type, is_like, created_at, updated_at)
     VALUES ($1, $2, $3, $4, NOW(), NOW())
     ON CONFLICT (user_id, target_type, target_id)
     DO UPDATE SET is_like = EXCLUDED.is_like, updated_at = NOW()
     RETURNING id, user_id, target_id, target_type, is_like, created_at, updated_at";

/// What a reaction points at.
///
/// Catalog entries (`video`, `movie`, `tvshow`, `episode`) and discussion
/// entries (`comment`, `review`, `comment_reply`) share one enum. The older
/// four-value set `video|comment|review|comment_reply` is a subset and stays
/// accepted unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Video,
    Movie,
    Tvshow,
    Episode,
    Comment,
    Review,
    CommentReply,
}

/// Where the owner of a target is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerSource {
    /// `videos.created_by`
    VideoCreator,
    /// `comments.member_id`
    CommentAuthor,
    /// `reviews.member_id`
    ReviewAuthor,
}

impl TargetType {
    pub const ALL: [TargetType; 7] = [
        TargetType::Video,
        TargetType::Movie,
        TargetType::Tvshow,
        TargetType::Episode,
        TargetType::Comment,
        TargetType::Review,
        TargetType::CommentReply,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Video => "video",
            TargetType::Movie => "movie",
            TargetType::Tvshow => "tvshow",
            TargetType::Episode => "episode",
            TargetType::Comment => "comment",
            TargetType::Review => "review",
            TargetType::CommentReply => "comment_reply",
        }
    }

    /// Owner lookup table for like notifications. Targets without an entry
    /// never notify anyone.
    pub fn owner_source(self) -> Option<OwnerSource> {
        match self {
            TargetType::Video => Some(OwnerSource::VideoCreator),
            TargetType::Comment => Some(OwnerSource::CommentAuthor),
            TargetType::Review => Some(OwnerSource::ReviewAuthor),
            TargetType::Movie
            | TargetType::Tvshow
            | TargetType::Episode
            | TargetType::CommentReply => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TargetType::Tvshow => "TV show",
            TargetType::CommentReply => "reply",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = TargetType::ALL.iter().map(|t| t.as_str()).collect();
                AppError::Validation(format!(
                    "Invalid target_type '{s}', expected one of: {}",
                    allowed.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionState {
    Neutral,
    Liked,
    Disliked,
}

/// The single store write a transition needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreWrite {
    Upsert { is_like: bool },
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ReactionState,
    pub to: ReactionState,
    pub write: StoreWrite,
    /// Set only when the tuple enters `Liked`.
    pub notify_owner: bool,
}

impl ReactionState {
    pub fn from_row(row: Option<&ReactionModel>) -> Self {
        match row {
            None => ReactionState::Neutral,
            Some(r) if r.is_like => ReactionState::Liked,
            Some(_) => ReactionState::Disliked,
        }
    }

    pub fn is_like(self) -> Option<bool> {
        match self {
            ReactionState::Neutral => None,
            ReactionState::Liked => Some(true),
            ReactionState::Disliked => Some(false),
        }
    }

    /// Repeating the current reaction returns to neutral; anything else
    /// moves to the requested reaction.
    pub fn apply(self, is_like: bool) -> Transition {
        if self.is_like() == Some(is_like) {
            return Transition {
                from: self,
                to: ReactionState::Neutral,
                write: StoreWrite::Delete,
                notify_owner: false,
            };
        }

        let to = if is_like {
            ReactionState::Liked
        } else {
            ReactionState::Disliked
        };
        Transition {
            from: self,
            to,
            write: StoreWrite::Upsert { is_like },
            notify_owner: to == ReactionState::Liked,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// The caller repeated their reaction; the row is gone.
    Removed,
    /// The row was created or flipped.
    Saved {
        reaction: ReactionModel,
        previous: ReactionState,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReactionCounts {
    pub likes: u64,
    pub dislikes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserReaction {
    pub has_reacted: bool,
    pub is_like: Option<bool>,
}

impl From<ReactionState> for UserReaction {
    fn from(state: ReactionState) -> Self {
        Self {
            has_reacted: state != ReactionState::Neutral,
            is_like: state.is_like(),
        }
    }
}

pub struct ReactionService {
    db: DatabaseConnection,
    hub: NotificationHub,
    cache: CacheService,
}

impl ReactionService {
    pub fn new(db: DatabaseConnection, hub: NotificationHub, cache: CacheService) -> Self {
        Self { db, hub, cache }
    }

    /// Apply one like/dislike press. Writes at most one reaction row and at
    /// most one notification.
    pub async fn toggle(
        &self,
        user_id: i32,
        target_id: i32,
        target_type: TargetType,
        is_like: bool,
    ) -> AppResult<ToggleOutcome> {
        let existing = self.find(user_id, target_id, target_type).await?;
        let previous = ReactionState::from_row(existing.as_ref());
        let transition = previous.apply(is_like);

        let outcome = match transition.write {
            StoreWrite::Delete => {
                self.delete(user_id, target_id, target_type).await?;
                ToggleOutcome::Removed
            }
            StoreWrite::Upsert { is_like } => {
                let reaction = self
                    .upsert(user_id, target_id, target_type, is_like)
                    .await?;
                ToggleOutcome::Saved { reaction, previous }
            }
        };

        tracing::debug!(
            user_id,
            target_id,
            target_type = %target_type,
            from = ?transition.from,
            to = ?transition.to,
            "reaction toggled"
        );

        self.cache
            .bump_generation(&count_generation_key(target_type, target_id))
            .await;

        if transition.notify_owner {
            self.notify_owner(user_id, target_id, target_type).await?;
        }

        Ok(outcome)
    }

    pub async fn counts(&self, target_id: i32, target_type: TargetType) -> AppResult<ReactionCounts> {
        let key = self
            .cache
            .generation(&count_generation_key(target_type, target_id))
            .await
            .map(|generation| count_cache_key(target_type, target_id, generation));
        if let Some(key) = &key {
            if let Some(hit) = self.cache.get::<ReactionCounts>(key).await {
                return Ok(hit);
            }
        }

        let rows: Vec<(bool, i64)> = Reaction::find()
            .select_only()
            .column(reaction::Column::IsLike)
            .column_as(reaction::Column::Id.count(), "total")
            .filter(reaction::Column::TargetType.eq(target_type.as_str()))
            .filter(reaction::Column::TargetId.eq(target_id))
            .group_by(reaction::Column::IsLike)
            .into_tuple()
            .all(&self.db)
            .await?;

        let counts = tally(&rows);
        if let Some(key) = &key {
            self.cache.set(key, &counts, COUNT_CACHE_TTL_SECS).await;
        }
        Ok(counts)
    }

    pub async fn user_reaction(
        &self,
        user_id: i32,
        target_id: i32,
        target_type: TargetType,
    ) -> AppResult<UserReaction> {
        let existing = self.find(user_id, target_id, target_type).await?;
        Ok(ReactionState::from_row(existing.as_ref()).into())
    }

    async fn find(
        &self,
        user_id: i32,
        target_id: i32,
        target_type: TargetType,
    ) -> AppResult<Option<ReactionModel>> {
        let row = Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::TargetType.eq(target_type.as_str()))
            .filter(reaction::Column::TargetId.eq(target_id))
            .one(&self.db)
            .await?;
        Ok(row)
    }

    async fn delete(&self, user_id: i32, target_id: i32, target_type: TargetType) -> AppResult<()> {
        Reaction::delete_many()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::TargetType.eq(target_type.as_str()))
            .filter(reaction::Column::TargetId.eq(target_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn upsert(
        &self,
        user_id: i32,
        target_id: i32,
        target_type: TargetType,
        is_like: bool,
    ) -> AppResult<ReactionModel> {
        Reaction::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                UPSERT_SQL,
                vec![
                    user_id.into(),
                    target_id.into(),
                    target_type.as_str().into(),
                    is_like.into(),
                ],
            ))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("reaction upsert returned no row")))
    }

    async fn resolve_owner(&self, target_id: i32, target_type: TargetType) -> AppResult<Option<i32>> {
        match target_type.owner_source() {
            Some(OwnerSource::VideoCreator) => {
                VideoService::new(self.db.clone()).owner_of(target_id).await
            }
            Some(OwnerSource::CommentAuthor) => {
                CommentService::new(self.db.clone()).owner_of(target_id).await
            }
            Some(OwnerSource::ReviewAuthor) => {
                ReviewService::new(self.db.clone()).owner_of(target_id).await
            }
            None => Ok(None),
        }
    }

    async fn notify_owner(&self, user_id: i32, target_id: i32, target_type: TargetType) -> AppResult<()> {
        let Some(owner_id) = self.resolve_owner(target_id, target_type).await? else {
            return Ok(());
        };
        if owner_id == user_id {
            return Ok(());
        }

        NotificationService::new(self.db.clone(), self.hub.clone())
            .notify(
                owner_id,
                user_id,
                kind::LIKE,
                target_type.as_str(),
                target_id,
                &format!("Someone liked your {}", target_type.label()),
            )
            .await?;
        Ok(())
    }
}

pub fn count_generation_key(target_type: TargetType, target_id: i32) -> String {
    format!("reactions:count:{target_type}:{target_id}:gen")
}

pub fn count_cache_key(target_type: TargetType, target_id: i32, generation: u64) -> String {
    format!("reactions:count:{target_type}:{target_id}:{generation}")
}

/// Fold `(is_like, count)` rows from the grouped query into totals.
fn tally(rows: &[(bool, i64)]) -> ReactionCounts {
    rows.iter()
        .fold(ReactionCounts::default(), |mut acc, &(is_like, n)| {
            let n = u64::try_from(n).unwrap_or(0);
            if is_like {
                acc.likes += n;
            } else {
                acc.dislikes += n;
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(is_like: bool) -> ReactionModel {
        let now = chrono::Utc::now().naive_utc();
        ReactionModel {
            id: 1,
            user_id: 1,
            target_id: 1,
            target_type: "video".to_string(),
            is_like,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_presence_maps_to_state() {
        assert_eq!(ReactionState::from_row(None), ReactionState::Neutral);
        assert_eq!(ReactionState::from_row(Some(&row(true))), ReactionState::Liked);
        assert_eq!(
            ReactionState::from_row(Some(&row(false))),
            ReactionState::Disliked
        );
    }

    #[test]
    fn neutral_like_upserts_and_notifies() {
        let t = ReactionState::Neutral.apply(true);
        assert_eq!(t.to, ReactionState::Liked);
        assert_eq!(t.write, StoreWrite::Upsert { is_like: true });
        assert!(t.notify_owner);
    }

    #[test]
    fn neutral_dislike_upserts_silently() {
        let t = ReactionState::Neutral.apply(false);
        assert_eq!(t.to, ReactionState::Disliked);
        assert_eq!(t.write, StoreWrite::Upsert { is_like: false });
        assert!(!t.notify_owner);
    }

    #[test]
    fn repeated_like_removes() {
        let t = ReactionState::Liked.apply(true);
        assert_eq!(t.to, ReactionState::Neutral);
        assert_eq!(t.write, StoreWrite::Delete);
        assert!(!t.notify_owner);
    }

    #[test]
    fn like_to_dislike_flips_silently() {
        let t = ReactionState::Liked.apply(false);
        assert_eq!(t.to, ReactionState::Disliked);
        assert_eq!(t.write, StoreWrite::Upsert { is_like: false });
        assert!(!t.notify_owner);
    }

    #[test]
    fn repeated_dislike_removes() {
        let t = ReactionState::Disliked.apply(false);
        assert_eq!(t.to, ReactionState::Neutral);
        assert_eq!(t.write, StoreWrite::Delete);
        assert!(!t.notify_owner);
    }

    #[test]
    fn dislike_to_like_flips_and_notifies() {
        let t = ReactionState::Disliked.apply(true);
        assert_eq!(t.to, ReactionState::Liked);
        assert_eq!(t.write, StoreWrite::Upsert { is_like: true });
        assert!(t.notify_owner);
    }

    #[test]
    fn same_press_twice_passes_through_neutral() {
        for start in [
            ReactionState::Neutral,
            ReactionState::Liked,
            ReactionState::Disliked,
        ] {
            for is_like in [true, false] {
                let first = start.apply(is_like);
                let second = first.to.apply(is_like);
                if start.is_like() == Some(is_like) {
                    // Removal first, then the same reaction again.
                    assert_eq!(second.to, start);
                } else {
                    assert_eq!(second.to, ReactionState::Neutral);
                }
                assert_ne!(first.to, second.to);
            }
        }
    }

    #[test]
    fn only_entering_liked_notifies() {
        for start in [
            ReactionState::Neutral,
            ReactionState::Liked,
            ReactionState::Disliked,
        ] {
            for is_like in [true, false] {
                let t = start.apply(is_like);
                assert_eq!(t.notify_owner, t.to == ReactionState::Liked);
            }
        }
    }

    #[test]
    fn target_type_round_trips_through_str() {
        for t in TargetType::ALL {
            assert_eq!(t.as_str().parse::<TargetType>().unwrap(), t);
            let json = serde_json::to_value(t).unwrap();
            assert_eq!(json, t.as_str());
        }
    }

    #[test]
    fn legacy_target_types_are_accepted() {
        for raw in ["video", "comment", "review", "comment_reply"] {
            assert!(raw.parse::<TargetType>().is_ok());
        }
    }

    #[test]
    fn bogus_target_type_is_invalid_argument() {
        assert!(matches!(
            "bogus".parse::<TargetType>(),
            Err(AppError::Validation(_))
        ));
        assert!("Video".parse::<TargetType>().is_err());
    }

    #[test]
    fn owner_table_covers_video_comment_review_only() {
        let with_owner: Vec<TargetType> = TargetType::ALL
            .into_iter()
            .filter(|t| t.owner_source().is_some())
            .collect();
        assert_eq!(
            with_owner,
            vec![TargetType::Video, TargetType::Comment, TargetType::Review]
        );
    }

    #[test]
    fn tally_splits_likes_and_dislikes() {
        assert_eq!(tally(&[]), ReactionCounts::default());
        assert_eq!(
            tally(&[(true, 3), (false, 2)]),
            ReactionCounts {
                likes: 3,
                dislikes: 2
            }
        );
    }

    #[test]
    fn user_reaction_serializes_camel_case() {
        let json = serde_json::to_value(UserReaction::from(ReactionState::Neutral)).unwrap();
        assert_eq!(json, serde_json::json!({ "hasReacted": false, "isLike": null }));
        let json = serde_json::to_value(UserReaction::from(ReactionState::Disliked)).unwrap();
        assert_eq!(json, serde_json::json!({ "hasReacted": true, "isLike": false }));
    }

    #[test]
    fn count_keys_are_scoped_by_type_and_generation() {
        assert_eq!(
            count_cache_key(TargetType::CommentReply, 5, 0),
            "reactions:count:comment_reply:5:0"
        );
        assert_ne!(
            count_cache_key(TargetType::Video, 5, 1),
            count_cache_key(TargetType::Video, 5, 2)
        );
        assert_eq!(
            count_generation_key(TargetType::Comment, 5),
            "reactions:count:comment:5:gen"
        );
    }
}
