pub mod rally;
pub mod traits;

pub use rally::*;
pub use traits::*;
