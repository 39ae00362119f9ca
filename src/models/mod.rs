//! Data models shared by the checker, registry and explorer commands.

pub mod description;
pub mod entity;
pub mod registry;

pub use description::RulesetDescription;
pub use entity::{EntityKind, RuleEntity};
pub use registry::{Registry, Rulesfile};
