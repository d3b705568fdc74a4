pub mod command_error;
pub mod command_handler;
pub mod config_get;
pub mod echo;
pub mod get;
pub mod keys;
pub mod ping;
pub mod set;
pub mod stream_utils;
pub mod type_command;
pub mod xadd;
pub mod xrange;
pub mod xread;

pub use command_error::CommandError;
pub use command_handler::{CommandHandler, CommandKind};
