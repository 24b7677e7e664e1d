use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Reactions {
    Table,
    Id,
    UserId,
    TargetId,
    TargetType,
    IsLike,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Members {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reactions::UserId).integer().not_null())
                    .col(ColumnDef::new(Reactions::TargetId).integer().not_null())
                    .col(
                        ColumnDef::new(Reactions::TargetType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reactions::IsLike).boolean().not_null())
                    .col(
                        ColumnDef::new(Reactions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Reactions::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reactions_user_id")
                            .from(Reactions::Table, Reactions::UserId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Conflict target of the toggle upsert.
        manager
            .create_index(
                Index::create()
                    .name("idx_reactions_unique")
                    .table(Reactions::Table)
                    .col(Reactions::UserId)
                    .col(Reactions::TargetType)
                    .col(Reactions::TargetId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reactions_target")
                    .table(Reactions::Table)
                    .col(Reactions::TargetType)
                    .col(Reactions::TargetId)
                    .col(Reactions::IsLike)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reactions::Table).to_owned())
            .await
    }
}
