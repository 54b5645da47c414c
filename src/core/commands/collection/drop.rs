// src/core/commands/collection/drop.rs

use crate::core::GatewayError;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{CommandFlags, ExecutableCommand, ParseCommand};
use crate::core::commands::context::ExecutionContext;
use crate::core::commands::helpers::{get_db, get_required_str, is_valid_collection_name};
use crate::core::protocol::{Document, ErrorCode};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct DropCollection {
    pub db: String,
    pub collection: String,
}

impl CommandSpec for DropCollection {
    const NAME: &'static str = "drop";
    const FLAGS: CommandFlags = CommandFlags::BACKEND;
}

impl ParseCommand for DropCollection {
    fn parse(request: &Document) -> Result<Self, GatewayError> {
        let db = get_db(request, Self::NAME)?;
        let collection = get_required_str(request, Self::NAME, Self::NAME)?;
        if !is_valid_collection_name(collection) {
            return Err(GatewayError::with_argument(
                ErrorCode::InvalidNamespace,
                format!("Invalid namespace specified '{db}.{collection}'"),
                Self::NAME,
            ));
        }
        Ok(DropCollection {
            db: db.to_string(),
            collection: collection.to_string(),
        })
    }
}

#[async_trait]
impl ExecutableCommand for DropCollection {
    async fn execute<'a>(&self, ctx: &mut ExecutionContext<'a>) -> Result<Document, GatewayError> {
        let mut conn = ctx.state.pool.acquire(ctx.cancel).await?;
        let result = conn
            .conn()?
            .drop_collection(ctx.cancel, &self.db, &self.collection)
            .await;
        let dropped = conn.settle(result)?;

        let mut response = Document::new();
        if dropped {
            // The backend only ever builds the `_id_` index.
            response.insert("nIndexesWas", 1);
            response.insert("ns", format!("{}.{}", self.db, self.collection));
        }
        Ok(response)
    }
}
