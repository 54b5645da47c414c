// src/core/tasks/mod.rs

//! Long-running background maintenance tasks.

pub mod pool_reaper;
pub mod session_reaper;

pub use pool_reaper::PoolReaperTask;
pub use session_reaper::SessionReaperTask;
