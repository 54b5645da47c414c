// src/core/commands/session/refresh_sessions.rs

use crate::core::GatewayError;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{CommandFlags, ExecutableCommand, ParseCommand};
use crate::core::commands::context::ExecutionContext;
use crate::core::commands::helpers::get_session_ids;
use crate::core::protocol::{Document, Value};
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshSessions {
    /// Raw `{id}` descriptors; malformed ones are skipped at execution.
    pub ids: Vec<Value>,
}

impl CommandSpec for RefreshSessions {
    const NAME: &'static str = "refreshSessions";
    const FLAGS: CommandFlags = CommandFlags::NO_AUTH;
}

impl ParseCommand for RefreshSessions {
    fn parse(request: &Document) -> Result<Self, GatewayError> {
        let ids = get_session_ids(request, Self::NAME)?;
        Ok(RefreshSessions { ids: ids.to_vec() })
    }
}

#[async_trait]
impl ExecutableCommand for RefreshSessions {
    async fn execute<'a>(&self, ctx: &mut ExecutionContext<'a>) -> Result<Document, GatewayError> {
        let refreshed = ctx.state.sessions.refresh_many(&self.ids, ctx.now);
        debug!("Refreshed {} of {} sessions.", refreshed, self.ids.len());
        Ok(Document::new())
    }
}
