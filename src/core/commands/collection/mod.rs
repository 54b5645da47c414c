// src/core/commands/collection/mod.rs

//! Commands that manage collections on the backend.

pub mod coll_stats;
pub mod create;
pub mod drop;

pub use self::coll_stats::CollStats;
pub use self::create::Create;
pub use self::drop::DropCollection;
