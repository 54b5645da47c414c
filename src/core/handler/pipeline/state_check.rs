// src/core/handler/pipeline/state_check.rs

//! Pipeline step for checking gateway state before a command runs.

use crate::core::GatewayError;
use crate::core::commands::{Command, CommandFlags};
use crate::core::state::GatewayState;

/// Fails commands that need a backend connection once the pool is closed,
/// before any session or backend work is done for them.
pub fn check_gateway_state(state: &GatewayState, command: &Command) -> Result<(), GatewayError> {
    if command.flags().contains(CommandFlags::BACKEND) && state.pool.is_closed() {
        return Err(GatewayError::PoolClosed);
    }
    Ok(())
}
