use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AlertComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlertComments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // One ledger per alert
                    .col(
                        ColumnDef::new(AlertComments::AlertId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AlertComments::Text).text().not_null())
                    .col(ColumnDef::new(AlertComments::Timestamp).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alert_comments_alert_id")
                            .from(AlertComments::Table, AlertComments::AlertId)
                            .to(Alerts::Table, Alerts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AlertComments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AlertComments {
    Table,
    Id,
    AlertId,
    Text,
    Timestamp,
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
}
