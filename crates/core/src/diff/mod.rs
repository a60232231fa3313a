//! Structural ABI diff.
//!
//! [`compare`] walks two [`crate::module::Module`]s: exported functions and
//! globals are matched by linker set key, their types are compared recursively
//! by [`TypeDiffer`], and one-sided entities are collected as lone changes. The
//! resulting [`DiffOutcome`] carries every message plus the aggregated
//! [`CompatibilityStatus`].

mod engine;
pub mod message;
mod policy;
mod status;
mod types;

pub use engine::{compare, compatibility_status, DiffOutcome, ElfChange};
pub use message::*;
pub use policy::DiffPolicy;
pub use status::*;
pub use types::{remove_thunk_info, TypeDiffer};
