pub mod category;
pub mod fault;
pub mod shape;

pub use category::*;
pub use fault::*;
pub use shape::*;
