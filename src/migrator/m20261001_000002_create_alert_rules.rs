use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AlertRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlertRules::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AlertRules::Name).string().not_null())
                    .col(ColumnDef::new(AlertRules::TargetMetric).string().not_null())
                    .col(ColumnDef::new(AlertRules::Operator).string_len(20).not_null())
                    .col(ColumnDef::new(AlertRules::ThresholdMin).double())
                    .col(ColumnDef::new(AlertRules::ThresholdMax).double())
                    .col(
                        ColumnDef::new(AlertRules::DurationSeconds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AlertRules::Priority)
                            .string_len(20)
                            .not_null()
                            .default("MEDIUM"),
                    )
                    .col(ColumnDef::new(AlertRules::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        // Monitoring looks rules up by metric on every sample
        manager
            .create_index(
                Index::create()
                    .name("idx_alert_rules_target_metric")
                    .table(AlertRules::Table)
                    .col(AlertRules::TargetMetric)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_alert_rules_target_metric")
                    .table(AlertRules::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(AlertRules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AlertRules {
    Table,
    Id,
    Name,
    TargetMetric,
    Operator,
    ThresholdMin,
    ThresholdMax,
    DurationSeconds,
    Priority,
    CreatedAt,
}
