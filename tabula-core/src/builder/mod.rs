//! Statement builder module

pub mod common;
pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

// Re-export types from submodules
pub use common::{
    Condition, Connective, IntoColumns, IntoCondition, IntoFieldValues, JoinClause, JoinType,
    OrderByClause, QueryBuilder, SortDirection, WhereToken,
};
pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;
