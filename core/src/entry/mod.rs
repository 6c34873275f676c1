//! entry/mod.rs
//! Hierarchy of nodes (folders) and accounts (field lists).
//!
//! Invariants kept by every `EntryTree` operation:
//! - labels are unique among direct siblings;
//! - a node's children carry indices `0..n` in order, detached entries carry none;
//! - every entry has at most one parent and a node is never its own ancestor.

pub mod types;
pub mod field;
pub mod tree;
pub mod path;
pub mod encode;
pub mod decode;

pub use types::*;
pub use field::*;
pub use tree::*;
