// src/core/commands/command_trait.rs

//! Defines the core traits for all executable commands.

use super::context::ExecutionContext;
use crate::core::GatewayError;
use crate::core::protocol::Document;
use async_trait::async_trait;
use bitflags::bitflags;

bitflags! {
    /// Flags that describe the properties and behavior of a command.
    /// The router's pipeline steps read them to decide which checks apply.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct CommandFlags: u32 {
        /// The command runs one operation on a pooled backend connection.
        const BACKEND        = 1 << 0;
        /// The command may run on a session that is not authenticated.
        const NO_AUTH        = 1 << 1;
    }
}

/// A trait for parsing a command's parameters from a decoded request.
pub trait ParseCommand: Sized {
    /// Validates the request fields and returns an instance of the command struct.
    fn parse(request: &Document) -> Result<Self, GatewayError>;
}

/// A trait for the actual execution logic of a command.
#[async_trait]
pub trait ExecutableCommand {
    /// Runs the command and returns the response body. The router appends `ok`.
    async fn execute<'a>(&self, ctx: &mut ExecutionContext<'a>) -> Result<Document, GatewayError>;
}
