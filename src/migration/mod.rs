use sea_orm_migration::prelude::*;

mod m20240101_000001_create_members_table;
mod m20240101_000002_create_refresh_tokens_table;
mod m20240101_000003_create_videos_table;
mod m20240101_000004_create_comments_table;
mod m20240101_000005_create_reviews_table;
mod m20240101_000006_create_reactions_table;
mod m20240101_000007_create_notifications_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_members_table::Migration),
            Box::new(m20240101_000002_create_refresh_tokens_table::Migration),
            Box::new(m20240101_000003_create_videos_table::Migration),
            Box::new(m20240101_000004_create_comments_table::Migration),
            Box::new(m20240101_000005_create_reviews_table::Migration),
            Box::new(m20240101_000006_create_reactions_table::Migration),
            Box::new(m20240101_000007_create_notifications_table::Migration),
        ]
    }
}
