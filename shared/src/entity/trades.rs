//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "trades")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub strategy_id: Option<Uuid>,
    pub symbol: String,
    pub side: String, // "Buy" or "Sell"
    pub market: Option<String>, // e.g. "stock, crypto"
    #[sea_orm(column_type = "Text")]
    pub quantity: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub stop_loss: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub take_profit: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub pnl: Option<String>,
    pub trade_date: Date,
    pub entry_time: Option<Time>,
    pub exit_time: Option<Time>,
    pub emotional_state: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::strategies::Entity",
        from = "Column::StrategyId",
        to = "super::strategies::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Strategies,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::strategies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Strategies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
