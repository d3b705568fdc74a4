use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

/// The pattern argument is required but not matched against; every live
/// key is listed.
pub struct KeysArguments;

impl KeysArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::InvalidKeysCommand);
        }

        Ok(Self)
    }
}

/// Handles `KEYS <pattern>`: an array of every live string key, the ones
/// loaded from the snapshot included, in sorted order.
pub async fn keys(store: &KeyValueStore, arguments: Vec<String>) -> Result<String, CommandError> {
    KeysArguments::parse(arguments)?;

    Ok(RespValue::bulk_string_array(store.keys().await).encode())
}
