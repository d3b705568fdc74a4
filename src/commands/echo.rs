use crate::{commands::command_error::CommandError, resp::RespValue};

pub struct EchoArguments {
    message: String,
}

impl EchoArguments {
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::InvalidEchoCommand);
        }

        Ok(Self {
            message: arguments.remove(0),
        })
    }
}

/// Handles the ECHO command.
///
/// # Returns
///
/// * `Ok(String)` - The message as a RESP bulk string
/// * `Err(CommandError::InvalidEchoCommand)` - If the number of arguments is not exactly 1
///
/// # Examples
///
/// ```ignore
/// let result = echo(vec!["hello world".to_string()]);
/// // Returns: "$11\r\nhello world\r\n"
/// ```
pub fn echo(arguments: Vec<String>) -> Result<String, CommandError> {
    let echo_arguments = EchoArguments::parse(arguments)?;

    Ok(RespValue::BulkString(echo_arguments.message).encode())
}
