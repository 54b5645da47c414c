// src/core/commands/session/logout.rs

use crate::core::GatewayError;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{CommandFlags, ExecutableCommand, ParseCommand};
use crate::core::commands::context::ExecutionContext;
use crate::core::protocol::Document;
use async_trait::async_trait;
use tracing::info;

/// Clears the user bound to the request's session. Repeating it is harmless.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Logout;

impl CommandSpec for Logout {
    const NAME: &'static str = "logout";
    const FLAGS: CommandFlags = CommandFlags::NO_AUTH;
}

impl ParseCommand for Logout {
    fn parse(_request: &Document) -> Result<Self, GatewayError> {
        Ok(Logout)
    }
}

#[async_trait]
impl ExecutableCommand for Logout {
    async fn execute<'a>(&self, ctx: &mut ExecutionContext<'a>) -> Result<Document, GatewayError> {
        if let Some(id) = ctx.session_id()
            && ctx.state.sessions.logout(id)
        {
            info!("Session {} logged out.", id);
        }
        Ok(Document::new())
    }
}
