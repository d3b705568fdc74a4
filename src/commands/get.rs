use crate::{
    commands::command_error::CommandError, key_value_store::KeyValueStore, resp::RespValue,
};

pub struct GetArguments {
    key: String,
}

impl GetArguments {
    pub fn parse(mut arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::InvalidGetCommand);
        }

        Ok(Self {
            key: arguments.remove(0),
        })
    }
}

/// Handles the GET command.
///
/// An entry whose expiry has passed is removed from the store and reported
/// as missing.
///
/// # Returns
///
/// * `Ok(String)` - A RESP bulk string with the value, or a null bulk string
///   if the key is missing or expired
/// * `Err(CommandError::InvalidGetCommand)` - If the number of arguments is not exactly 1
///
/// # Examples
///
/// ```ignore
/// // GET mykey
/// let result = get(&store, vec!["mykey".to_string()]).await;
/// // Returns: "$5\r\nhello\r\n" or "$-1\r\n"
/// ```
pub async fn get(store: &KeyValueStore, arguments: Vec<String>) -> Result<String, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    match store.get(&get_arguments.key).await {
        Some(value) => Ok(RespValue::BulkString(value).encode()),
        None => Ok(RespValue::NullBulkString.encode()),
    }
}
