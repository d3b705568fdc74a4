use crate::{commands::command_error::CommandError, resp::RespValue, server::RedisServer};

pub struct ConfigGetArguments {
    parameter: String,
}

impl ConfigGetArguments {
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::InvalidConfigGetCommand);
        }

        Ok(Self {
            parameter: arguments.remove(0),
        })
    }
}

/// Handles `CONFIG GET <parameter>`, replying `[parameter, value]` with the
/// parameter name in lowercase.
pub fn config_get(server: &RedisServer, arguments: Vec<String>) -> Result<String, CommandError> {
    let config_get_arguments = ConfigGetArguments::parse(arguments)?;

    let Some(value) = server.config_value(&config_get_arguments.parameter) else {
        return Err(CommandError::UnknownConfigParameter(
            config_get_arguments.parameter,
        ));
    };

    let parameter = config_get_arguments.parameter.to_ascii_lowercase();

    Ok(RespValue::bulk_string_array([parameter.as_str(), value]).encode())
}
