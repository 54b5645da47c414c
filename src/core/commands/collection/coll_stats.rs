// src/core/commands/collection/coll_stats.rs

use crate::core::GatewayError;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{CommandFlags, ExecutableCommand, ParseCommand};
use crate::core::commands::context::ExecutionContext;
use crate::core::commands::helpers::{get_db, get_required_str, get_scale};
use crate::core::protocol::Document;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct CollStats {
    pub db: String,
    pub collection: String,
    /// Divisor applied to every reported size.
    pub scale: f64,
}

impl CommandSpec for CollStats {
    const NAME: &'static str = "collStats";
    const FLAGS: CommandFlags = CommandFlags::BACKEND;
}

impl ParseCommand for CollStats {
    fn parse(request: &Document) -> Result<Self, GatewayError> {
        let db = get_db(request, Self::NAME)?;
        let collection = get_required_str(request, Self::NAME, Self::NAME)?;
        let scale = get_scale(request, Self::NAME)?;
        Ok(CollStats {
            db: db.to_string(),
            collection: collection.to_string(),
            scale,
        })
    }
}

#[async_trait]
impl ExecutableCommand for CollStats {
    async fn execute<'a>(&self, ctx: &mut ExecutionContext<'a>) -> Result<Document, GatewayError> {
        let mut conn = ctx.state.pool.acquire(ctx.cancel).await?;
        let result = conn
            .conn()?
            .coll_stats(ctx.cancel, &self.db, &self.collection, self.scale)
            .await;
        conn.settle(result)
    }
}
