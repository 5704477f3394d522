use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WebhookSubscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WebhookSubscriptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WebhookSubscriptions::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(WebhookSubscriptions::Name).string().not_null())
                    .col(ColumnDef::new(WebhookSubscriptions::Url).string().not_null())
                    .col(ColumnDef::new(WebhookSubscriptions::Events).json().not_null())
                    .col(ColumnDef::new(WebhookSubscriptions::Secret).string().not_null())
                    .col(ColumnDef::new(WebhookSubscriptions::Headers).json())
                    .col(
                        ColumnDef::new(WebhookSubscriptions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(WebhookSubscriptions::RetryCount)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(WebhookSubscriptions::TimeoutMs)
                            .integer()
                            .not_null()
                            .default(5000),
                    )
                    .col(
                        ColumnDef::new(WebhookSubscriptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WebhookSubscriptions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_webhook_subscriptions_owner")
                    .table(WebhookSubscriptions::Table)
                    .col(WebhookSubscriptions::OwnerId)
                    .col(WebhookSubscriptions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_webhook_subscriptions_active")
                    .table(WebhookSubscriptions::Table)
                    .col(WebhookSubscriptions::IsActive)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WebhookSubscriptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WebhookSubscriptions {
    Table,
    Id,
    OwnerId,
    Name,
    Url,
    Events,
    Secret,
    Headers,
    IsActive,
    RetryCount,
    TimeoutMs,
    CreatedAt,
    UpdatedAt,
}
