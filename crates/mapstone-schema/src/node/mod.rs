mod cache;
mod converter;
mod param_map;
mod result_map;
mod statement;
mod unit;

pub use cache::CacheDescriptor;
pub use converter::ConverterDescriptor;
pub use param_map::{ParamDescriptor, ParamMapDescriptor};
pub use result_map::{
    BindingDescriptor, DiscriminatorCaseDescriptor, DiscriminatorDescriptor, FieldDescriptor,
    NestedDescriptor, ResultMapDescriptor,
};
pub use statement::StatementDescriptor;
pub use unit::UnitDescriptor;
