use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
    stream_store::StreamStore,
};

pub struct TypeArguments {
    key: String,
}

impl TypeArguments {
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::InvalidTypeCommand);
        }

        Ok(Self {
            key: arguments.remove(0),
        })
    }
}

/// Handles `TYPE <key>`, replying `string`, `stream` or `none`.
///
/// The string keyspace is consulted first, so an expired string key is
/// dropped here just as it would be by GET.
pub async fn type_command(
    store: &KeyValueStore,
    streams: &StreamStore,
    arguments: Vec<String>,
) -> Result<String, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;

    let type_name = if store.contains_key(&type_arguments.key).await {
        "string"
    } else if streams.contains_key(&type_arguments.key).await {
        "stream"
    } else {
        "none"
    };

    Ok(RespValue::SimpleString(type_name.to_string()).encode())
}
