// src/core/commands/session/mod.rs

//! Commands that operate on logical sessions and their authentication state.
//! None of them touch the backend.

pub mod authenticate;
pub mod connection_status;
pub mod end_sessions;
pub mod logout;
pub mod refresh_sessions;

pub use self::authenticate::Authenticate;
pub use self::connection_status::ConnectionStatus;
pub use self::end_sessions::EndSessions;
pub use self::logout::Logout;
pub use self::refresh_sessions::RefreshSessions;
