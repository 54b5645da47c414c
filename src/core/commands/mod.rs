// src/core/commands/mod.rs

//! This module defines all supported commands, organizes them into categories,
//! and provides the central `Command` enum that encapsulates their parsed state.
//! The `define_commands!` macro is used to generate the enum and its dispatch
//! implementations.

use crate::core::GatewayError;
use crate::core::protocol::{Document, ErrorCode};
use async_trait::async_trait;

pub use command_spec::CommandSpec;
pub use command_trait::{CommandFlags, ExecutableCommand, ParseCommand};
pub use context::ExecutionContext;

#[macro_use]
mod command_def;

pub mod collection;
pub mod command_spec;
pub mod command_trait;
pub mod context;
pub mod generic;
pub mod helpers;
pub mod session;

define_commands! {
    // --- Collection Commands ---
    (Create, Create, collection),
    (Drop, DropCollection, collection),
    (CollStats, CollStats, collection),

    // --- Session Commands ---
    (RefreshSessions, RefreshSessions, session),
    (EndSessions, EndSessions, session),
    (Logout, Logout, session),
    (ConnectionStatus, ConnectionStatus, session),
    (Authenticate, Authenticate, session),

    // --- Generic Commands ---
    (Ping, Ping, generic),
}
