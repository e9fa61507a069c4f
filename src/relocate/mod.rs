//! Relocation module
//!
//! Rename, copy, move and delete inside the confinement root, with
//! collision-free destinations and a copy-then-remove fallback when the host
//! refuses an atomic rename.

mod operations;
mod plan;
mod strategy;

pub use operations::{RelocationOp, Relocator, delete, parent_of_hint};
pub use plan::{RelocationPlan, disambiguate, plan_relocation};
pub use strategy::{NativeRename, RenameStrategy, copy_tree, remove_tree};
