pub mod common;
pub mod query;
pub mod record;

pub use common::*;
pub use query::*;
pub use record::*;
