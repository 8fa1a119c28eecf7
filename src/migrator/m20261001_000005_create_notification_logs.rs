use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NotificationLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotificationLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NotificationLogs::AlertId).integer().not_null())
                    .col(ColumnDef::new(NotificationLogs::RecipientId).integer().not_null())
                    .col(ColumnDef::new(NotificationLogs::Channel).string_len(20).not_null())
                    .col(ColumnDef::new(NotificationLogs::Status).string_len(20).not_null())
                    .col(ColumnDef::new(NotificationLogs::TimestampSent).date_time().not_null())
                    .col(
                        ColumnDef::new(NotificationLogs::ErrorMessage)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_logs_alert_id")
                            .from(NotificationLogs::Table, NotificationLogs::AlertId)
                            .to(Alerts::Table, Alerts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_logs_recipient_id")
                            .from(NotificationLogs::Table, NotificationLogs::RecipientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum NotificationLogs {
    Table,
    Id,
    AlertId,
    RecipientId,
    Channel,
    Status,
    TimestampSent,
    ErrorMessage,
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
