//! Table metadata loaded from `information_schema`, plus CRUD on top of it

pub mod column;
mod introspect;
pub mod registry;
pub mod table;

pub use column::{ColumnMeta, IndexMeta};
pub use registry::Registry;
pub use table::{SelectOptions, TableSchema, DEFAULT_SELECT_LIMIT};
