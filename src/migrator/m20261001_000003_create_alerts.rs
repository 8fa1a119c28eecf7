use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alerts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alerts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alerts::RuleId).integer())
                    // Snapshot of the rule at generation time
                    .col(ColumnDef::new(Alerts::RuleName).string().not_null())
                    .col(ColumnDef::new(Alerts::TargetMetric).string().not_null())
                    .col(ColumnDef::new(Alerts::TriggeringValue).double().not_null())
                    .col(ColumnDef::new(Alerts::TimestampGenerated).date_time().not_null())
                    .col(ColumnDef::new(Alerts::TimestampAcknowledged).date_time())
                    .col(ColumnDef::new(Alerts::TimestampClosed).date_time())
                    .col(
                        ColumnDef::new(Alerts::Status)
                            .string_len(20)
                            .not_null()
                            .default("NEW"),
                    )
                    .col(ColumnDef::new(Alerts::Priority).string_len(20).not_null())
                    .col(ColumnDef::new(Alerts::AcknowledgedBy).integer())
                    .col(ColumnDef::new(Alerts::ClosedBy).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alerts_rule_id")
                            .from(Alerts::Table, Alerts::RuleId)
                            .to(AlertRules::Table, AlertRules::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alerts_acknowledged_by")
                            .from(Alerts::Table, Alerts::AcknowledgedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alerts_closed_by")
                            .from(Alerts::Table, Alerts::ClosedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_alerts_status")
                    .table(Alerts::Table)
                    .col(Alerts::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_alerts_status")
                    .table(Alerts::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Alerts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
    RuleId,
    RuleName,
    TargetMetric,
    TriggeringValue,
    TimestampGenerated,
    TimestampAcknowledged,
    TimestampClosed,
    Status,
    Priority,
    AcknowledgedBy,
    ClosedBy,
}

#[derive(DeriveIden)]
enum AlertRules {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
