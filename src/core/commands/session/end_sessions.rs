// src/core/commands/session/end_sessions.rs

use crate::core::GatewayError;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{CommandFlags, ExecutableCommand, ParseCommand};
use crate::core::commands::context::ExecutionContext;
use crate::core::commands::helpers::get_session_ids;
use crate::core::protocol::{Document, Value};
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct EndSessions {
    pub ids: Vec<Value>,
}

impl CommandSpec for EndSessions {
    const NAME: &'static str = "endSessions";
    const FLAGS: CommandFlags = CommandFlags::NO_AUTH;
}

impl ParseCommand for EndSessions {
    fn parse(request: &Document) -> Result<Self, GatewayError> {
        let ids = get_session_ids(request, Self::NAME)?;
        Ok(EndSessions { ids: ids.to_vec() })
    }
}

#[async_trait]
impl ExecutableCommand for EndSessions {
    async fn execute<'a>(&self, ctx: &mut ExecutionContext<'a>) -> Result<Document, GatewayError> {
        let ended = ctx.state.sessions.end_many(&self.ids);
        debug!("Ended {} of {} sessions.", ended, self.ids.len());
        Ok(Document::new())
    }
}
