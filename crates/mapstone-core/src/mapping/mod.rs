mod binding;
mod param_map;
mod result_map;
mod sql;
mod statement;

pub use binding::{BindingFlags, ParamBinding, ResultBinding, ResultBindingBuilder};
pub use param_map::ParamMap;
pub use result_map::{Discriminator, ResultMap, ResultMapBuilder};
pub use sql::{BoundSql, SqlSource};
pub use statement::{Statement, StatementBuilder};
