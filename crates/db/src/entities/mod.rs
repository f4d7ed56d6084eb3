//! `SeaORM` entity definitions.

pub mod budget_lines;
pub mod document_line_items;
pub mod documents;
pub mod funds;
pub mod sea_orm_active_enums;
