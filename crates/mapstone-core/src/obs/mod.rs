pub mod sink;

pub use sink::{BuildEvent, BuildSink, with_build_sink};
