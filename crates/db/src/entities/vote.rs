//! Vote entity: one paid vote batch credited to a contestant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub receipt_number: String,

    pub contestant_id: String,

    pub voter_name: String,
    #[sea_orm(nullable)]
    pub voter_email: Option<String>,

    /// Amount paid in rupiah
    pub amount: i64,
    pub vote_quantity: i32,

    /// Payment provider transaction id; a vote is credited at most once per id
    #[sea_orm(unique)]
    pub transaction_id: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contestant::Entity",
        from = "Column::ContestantId",
        to = "super::contestant::Column::Id",
        on_delete = "Cascade"
    )]
    Contestant,
}

impl Related<super::contestant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contestant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
