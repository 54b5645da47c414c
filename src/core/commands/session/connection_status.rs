// src/core/commands/session/connection_status.rs

use crate::core::GatewayError;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{CommandFlags, ExecutableCommand, ParseCommand};
use crate::core::commands::context::ExecutionContext;
use crate::core::protocol::{Document, Value};
use async_trait::async_trait;

/// Reports which user, if any, the request's session is authenticated as.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionStatus;

impl CommandSpec for ConnectionStatus {
    const NAME: &'static str = "connectionStatus";
    const FLAGS: CommandFlags = CommandFlags::NO_AUTH;
}

impl ParseCommand for ConnectionStatus {
    fn parse(_request: &Document) -> Result<Self, GatewayError> {
        Ok(ConnectionStatus)
    }
}

#[async_trait]
impl ExecutableCommand for ConnectionStatus {
    async fn execute<'a>(&self, ctx: &mut ExecutionContext<'a>) -> Result<Document, GatewayError> {
        let users: Vec<Value> = ctx
            .session_id()
            .and_then(|id| ctx.state.sessions.authenticated_user(id))
            .map(|user| {
                Value::Document(
                    Document::new()
                        .with("user", user.username)
                        .with("db", user.db),
                )
            })
            .into_iter()
            .collect();

        let auth_info = Document::new()
            .with("authenticatedUsers", users)
            .with("authenticatedUserRoles", Vec::<Value>::new());
        Ok(Document::new().with("authInfo", auth_info))
    }
}
