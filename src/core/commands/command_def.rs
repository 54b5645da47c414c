// src/core/commands/command_def.rs

//! The `define_commands!` macro, which generates the `Command` enum from a
//! list of `(Variant, Type, module)` entries.

macro_rules! define_commands {
    ($( ($variant:ident, $ty:ident, $module:ident) ),* $(,)?) => {
        /// A parsed, validated command ready for execution.
        #[derive(Debug, Clone)]
        pub enum Command {
            $( $variant($module::$ty), )*
        }

        impl Command {
            /// Every command name the gateway understands.
            pub const NAMES: &'static [&'static str] = &[
                $( <$module::$ty as CommandSpec>::NAME, )*
            ];

            /// Looks up a command's flags by name without parsing its parameters.
            pub fn flags_for(name: &str) -> Option<CommandFlags> {
                $(
                    if name == <$module::$ty as CommandSpec>::NAME {
                        return Some(<$module::$ty as CommandSpec>::FLAGS);
                    }
                )*
                None
            }

            /// Parses a request whose first key names the command.
            pub fn from_request(request: &Document) -> Result<Self, GatewayError> {
                let name = request.command().ok_or_else(|| {
                    GatewayError::protocol(ErrorCode::FailedToParse, "empty command document")
                })?;
                $(
                    if name == <$module::$ty as CommandSpec>::NAME {
                        return Ok(Command::$variant(<$module::$ty as ParseCommand>::parse(request)?));
                    }
                )*
                Err(GatewayError::protocol(
                    ErrorCode::CommandNotFound,
                    format!("no such command: '{name}'"),
                ))
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $( Command::$variant(_) => <$module::$ty as CommandSpec>::NAME, )*
                }
            }

            pub fn flags(&self) -> CommandFlags {
                match self {
                    $( Command::$variant(_) => <$module::$ty as CommandSpec>::FLAGS, )*
                }
            }
        }

        #[async_trait]
        impl ExecutableCommand for Command {
            async fn execute<'a>(
                &self,
                ctx: &mut ExecutionContext<'a>,
            ) -> Result<Document, GatewayError> {
                match self {
                    $( Command::$variant(cmd) => cmd.execute(ctx).await, )*
                }
            }
        }
    };
}
