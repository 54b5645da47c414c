// src/core/commands/generic/mod.rs

pub mod ping;

pub use self::ping::Ping;
