use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Delegations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Delegations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Delegations::UpstreamId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Delegations::Delegator).text().not_null())
                    .col(ColumnDef::new(Delegations::Delegate).text().not_null())
                    .col(ColumnDef::new(Delegations::Timestamp).big_integer().not_null())
                    .col(
                        ColumnDef::new(Delegations::Amount)
                            .decimal_len(30, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Delegations::Level).big_integer().not_null())
                    .col(
                        ColumnDef::new(Delegations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing orders by timestamp descending
        manager
            .create_index(
                Index::create()
                    .name("idx_delegations_timestamp")
                    .table(Delegations::Table)
                    .col((Delegations::Timestamp, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_delegations_level")
                    .table(Delegations::Table)
                    .col(Delegations::Level)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Delegations::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Delegations {
    Table,
    Id,
    UpstreamId,
    Delegator,
    Delegate,
    Timestamp,
    Amount,
    Level,
    CreatedAt,
}
