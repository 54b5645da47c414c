// src/core/commands/command_spec.rs

//! Defines the `CommandSpec` trait, which provides static metadata about a command.
//! The router reads it before parsing so that authorization can run first.

use crate::core::commands::command_trait::CommandFlags;

/// A trait for describing a command's name and behavior flags.
pub trait CommandSpec {
    /// The command name exactly as it appears as the first key of a request.
    const NAME: &'static str;

    /// A bitmask of flags describing the command's behavior (e.g., `BACKEND`, `NO_AUTH`).
    const FLAGS: CommandFlags;
}
