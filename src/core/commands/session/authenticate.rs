// src/core/commands/session/authenticate.rs

use crate::core::GatewayError;
use crate::core::auth::AUTH_FAILURE_DELAY;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{CommandFlags, ExecutableCommand, ParseCommand};
use crate::core::commands::context::ExecutionContext;
use crate::core::commands::helpers::{get_db, get_required_str};
use crate::core::protocol::{Document, ErrorCode};
use async_trait::async_trait;
use tracing::{info, warn};

/// Verifies a username and password and binds the user to the request's session.
#[derive(Clone, PartialEq)]
pub struct Authenticate {
    pub user: String,
    pub password: String,
    /// The authentication database, taken from `$db`.
    pub db: String,
}

impl std::fmt::Debug for Authenticate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticate")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("db", &self.db)
            .finish()
    }
}

impl CommandSpec for Authenticate {
    const NAME: &'static str = "authenticate";
    const FLAGS: CommandFlags = CommandFlags::NO_AUTH;
}

impl ParseCommand for Authenticate {
    fn parse(request: &Document) -> Result<Self, GatewayError> {
        let db = get_db(request, Self::NAME)?;
        let user = get_required_str(request, Self::NAME, "user")?;
        let password = get_required_str(request, Self::NAME, "pwd")?;
        Ok(Authenticate {
            user: user.to_string(),
            password: password.to_string(),
            db: db.to_string(),
        })
    }
}

#[async_trait]
impl ExecutableCommand for Authenticate {
    async fn execute<'a>(&self, ctx: &mut ExecutionContext<'a>) -> Result<Document, GatewayError> {
        let Some(session_id) = ctx.session_id().cloned() else {
            return Err(GatewayError::with_argument(
                ErrorCode::BadValue,
                "authenticate requires a logical session (lsid)",
                "lsid",
            ));
        };

        match ctx.state.users.verify(&self.user, &self.db, &self.password) {
            Some(user) => {
                ctx.state
                    .sessions
                    .bind_authenticated_user(&session_id, user, ctx.now)?;
                info!("Session {} authenticated as {}@{}.", session_id, self.user, self.db);
                Ok(Document::new()
                    .with("dbname", self.db.clone())
                    .with("user", self.user.clone()))
            }
            None => {
                warn!("Failed authentication attempt for {}@{}.", self.user, self.db);
                // Slow down password guessing.
                tokio::time::sleep(AUTH_FAILURE_DELAY).await;
                Err(GatewayError::protocol(
                    ErrorCode::AuthenticationFailed,
                    "Authentication failed.",
                ))
            }
        }
    }
}
