//! Rule set checker: change classification and engine-backed validation.

pub mod compare;
pub mod engine;
pub mod tiers;

pub use engine::{EngineRunner, Validation};
pub use tiers::{compare, compare_major, compare_minor, compare_patch, ChangeReport};
