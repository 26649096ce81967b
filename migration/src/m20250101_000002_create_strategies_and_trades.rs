use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_users_and_sessions::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Strategies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Strategies::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Strategies::UserId).uuid().not_null())
                    .col(ColumnDef::new(Strategies::Name).text().not_null())
                    .col(ColumnDef::new(Strategies::Rules).text().not_null()) // JSON array of strings
                    .col(ColumnDef::new(Strategies::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_strategies_user")
                            .from(Strategies::Table, Strategies::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_strategies_user")
                    .table(Strategies::Table)
                    .col(Strategies::UserId)
                    .to_owned(),
            )
            .await?;

        // Money columns are stored as decimal text
        manager
            .create_table(
                Table::create()
                    .table(Trades::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Trades::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Trades::UserId).uuid().not_null())
                    .col(ColumnDef::new(Trades::StrategyId).uuid().null())
                    .col(ColumnDef::new(Trades::Symbol).string().not_null())
                    .col(ColumnDef::new(Trades::Side).string().not_null()) // "Buy" or "Sell"
                    .col(ColumnDef::new(Trades::Market).string().null())
                    .col(ColumnDef::new(Trades::Quantity).text().not_null())
                    .col(ColumnDef::new(Trades::StopLoss).text().null())
                    .col(ColumnDef::new(Trades::TakeProfit).text().null())
                    .col(ColumnDef::new(Trades::Pnl).text().null())
                    .col(ColumnDef::new(Trades::TradeDate).date().not_null())
                    .col(ColumnDef::new(Trades::EntryTime).time().null())
                    .col(ColumnDef::new(Trades::ExitTime).time().null())
                    .col(ColumnDef::new(Trades::EmotionalState).string().null())
                    .col(ColumnDef::new(Trades::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trades_user")
                            .from(Trades::Table, Trades::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trades_strategy")
                            .from(Trades::Table, Trades::StrategyId)
                            .to(Strategies::Table, Strategies::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_trades_user_date")
                    .table(Trades::Table)
                    .col(Trades::UserId)
                    .col(Trades::TradeDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trades::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Strategies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Strategies {
    Table,
    Id,
    UserId,
    Name,
    Rules,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Trades {
    Table,
    Id,
    UserId,
    StrategyId,
    Symbol,
    Side,
    Market,
    Quantity,
    StopLoss,
    TakeProfit,
    Pnl,
    TradeDate,
    EntryTime,
    ExitTime,
    EmotionalState,
    CreatedAt,
}
