// src/core/commands/collection/create.rs

use crate::core::GatewayError;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{CommandFlags, ExecutableCommand, ParseCommand};
use crate::core::commands::context::ExecutionContext;
use crate::core::commands::helpers::{get_db, get_required_str, is_valid_collection_name};
use crate::core::protocol::{Document, ErrorCode};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct Create {
    pub db: String,
    pub collection: String,
}

impl CommandSpec for Create {
    const NAME: &'static str = "create";
    const FLAGS: CommandFlags = CommandFlags::BACKEND;
}

impl ParseCommand for Create {
    fn parse(request: &Document) -> Result<Self, GatewayError> {
        let db = get_db(request, Self::NAME)?;
        let collection = get_required_str(request, Self::NAME, Self::NAME)?;
        if !is_valid_collection_name(collection) {
            return Err(GatewayError::with_argument(
                ErrorCode::InvalidNamespace,
                format!("Invalid collection name: {collection}"),
                Self::NAME,
            ));
        }
        Ok(Create {
            db: db.to_string(),
            collection: collection.to_string(),
        })
    }
}

#[async_trait]
impl ExecutableCommand for Create {
    async fn execute<'a>(&self, ctx: &mut ExecutionContext<'a>) -> Result<Document, GatewayError> {
        let mut conn = ctx.state.pool.acquire(ctx.cancel).await?;
        let result = conn
            .conn()?
            .create_collection(ctx.cancel, &self.db, &self.collection)
            .await;
        conn.settle(result)?;
        Ok(Document::new())
    }
}
