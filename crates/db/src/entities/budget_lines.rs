//! `SeaORM` Entity for budget_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub fiscal_year_id: Uuid,
    pub fund_id: Uuid,
    pub department_id: Uuid,
    pub sub_department_id: Uuid,
    pub chart_of_account_id: Uuid,
    pub project_id: Uuid,
    pub original_appropriation: Decimal,
    pub adjustments: Decimal,
    pub released_allotment: Decimal,
    pub charges: Decimal,
    pub pre_encumbrance: Decimal,
    pub encumbrance: Decimal,
    pub monthly_allocations: Json,
    pub overdrawn: bool,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
