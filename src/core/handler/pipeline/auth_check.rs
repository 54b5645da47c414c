// src/core/handler/pipeline/auth_check.rs

//! Pipeline step for enforcing authentication.

use crate::core::GatewayError;
use crate::core::commands::{Command, CommandFlags};
use crate::core::protocol::ErrorCode;
use crate::core::session::Session;
use crate::core::state::GatewayState;

/// Rejects a command that needs an authenticated session when the request's
/// session has none.
///
/// Unknown command names pass through so the parser can report them.
pub fn check_authorization(
    state: &GatewayState,
    command_name: &str,
    session: Option<&Session>,
) -> Result<(), GatewayError> {
    if !state.users.is_enabled() {
        return Ok(());
    }

    let Some(flags) = Command::flags_for(command_name) else {
        return Ok(());
    };
    if flags.contains(CommandFlags::NO_AUTH) {
        return Ok(());
    }

    if session.is_some_and(|s| s.authenticated_user.is_some()) {
        return Ok(());
    }
    Err(GatewayError::protocol(
        ErrorCode::Unauthorized,
        format!("Command {command_name} requires authentication"),
    ))
}
