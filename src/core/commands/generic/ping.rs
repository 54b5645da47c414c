// src/core/commands/generic/ping.rs

use crate::core::GatewayError;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{CommandFlags, ExecutableCommand, ParseCommand};
use crate::core::commands::context::ExecutionContext;
use crate::core::protocol::Document;
use async_trait::async_trait;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ping;

impl CommandSpec for Ping {
    const NAME: &'static str = "ping";
    const FLAGS: CommandFlags = CommandFlags::NO_AUTH;
}

impl ParseCommand for Ping {
    fn parse(_request: &Document) -> Result<Self, GatewayError> {
        Ok(Ping)
    }
}

#[async_trait]
impl ExecutableCommand for Ping {
    async fn execute<'a>(&self, _ctx: &mut ExecutionContext<'a>) -> Result<Document, GatewayError> {
        Ok(Document::new())
    }
}
