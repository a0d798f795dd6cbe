pub mod pipeline;
pub mod propagate;
pub mod resolve;
pub mod shape;

pub use pipeline::*;
pub use propagate::*;
pub use resolve::*;
pub use shape::*;
