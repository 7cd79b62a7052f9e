//! Per-category counter backing invoice sequence numbers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_sequence")]
pub struct Model {
    /// Category name (`Acting`, `Vocal`, `Model`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub category: String,

    /// Last value handed out; the next allocation returns `last_value + 1`
    pub last_value: i32,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
