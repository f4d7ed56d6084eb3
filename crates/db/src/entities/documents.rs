//! `SeaORM` Entity for documents table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DocumentKind, DocumentStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub invoice_number: String,
    pub invoice_seq: i32,
    pub invoice_year: i32,
    pub kind: DocumentKind,
    pub status: DocumentStatus,
    pub amount: Decimal,
    pub payload: Json,
    pub requested_by: Uuid,
    pub request_date: DateTimeWithTimeZone,
    pub remarks: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_date: Option<DateTimeWithTimeZone>,
    pub rejection_reason: Option<String>,
    pub applied: bool,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::document_line_items::Entity")]
    DocumentLineItems,
}

impl Related<super::document_line_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentLineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
