pub mod compare;
pub mod config;
pub mod dump;

pub use compare::*;
pub use config::*;
pub use dump::*;
