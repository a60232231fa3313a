//! abi-core
//!
//! Structural ABI compatibility checking for native libraries.
//!
//! A library's exported interface arrives as a JSON dump ([`dump`]) and is
//! loaded into a [`module::Module`]: a keyed type graph plus the functions,
//! global variables and ELF symbols it exports. [`diff::compare`] walks two
//! modules side by side and [`report::DiffReport`] turns the outcome into the
//! categorized report consumed by the `abi-diff` CLI.

pub mod model;
pub mod module;
pub mod dump;
pub mod diff;
pub mod report;
