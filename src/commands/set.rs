use jiff::{SignedDuration, Timestamp};

use crate::{
    commands::command_error::CommandError,
    key_value_store::{KeyValueStore, Value},
    resp::RespValue,
};

/// Parsed arguments of the SET command.
pub struct SetArguments {
    key: String,
    value: String,
    /// Absolute instant at which the entry stops being visible
    expiration: Option<Timestamp>,
}

impl SetArguments {
    /// Parses `[key, value]` or `[key, value, "PX", milliseconds]`.
    ///
    /// The expiry is turned into an absolute instant here, so the lifetime of
    /// the key starts when the command is parsed.
    ///
    /// # Returns
    ///
    /// * `Err(CommandError::InvalidSetCommand)` - If the number of arguments is not 2 or 4
    /// * `Err(CommandError::InvalidSetCommandArgument)` - If the option is not "PX" (case-insensitive)
    /// * `Err(CommandError::InvalidSetCommandExpiration)` - If the milliseconds are not a
    ///   non-negative integer or push the expiry out of range
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 && arguments.len() != 4 {
            return Err(CommandError::InvalidSetCommand);
        }

        let mut expiration = None;

        if arguments.len() == 4 {
            if !arguments[2].eq_ignore_ascii_case("px") {
                return Err(CommandError::InvalidSetCommandArgument);
            }

            let milliseconds = arguments[3]
                .parse::<u64>()
                .ok()
                .and_then(|ms| i64::try_from(ms).ok())
                .ok_or(CommandError::InvalidSetCommandExpiration)?;

            let expires_at = Timestamp::now()
                .checked_add(SignedDuration::from_millis(milliseconds))
                .map_err(|_| CommandError::InvalidSetCommandExpiration)?;

            expiration = Some(expires_at);
        }

        let mut arguments = arguments.into_iter();

        Ok(Self {
            key: arguments.next().unwrap_or_default(),
            value: arguments.next().unwrap_or_default(),
            expiration,
        })
    }
}

/// Handles the SET command.
///
/// Overwrites any previous value and expiry of the key.
///
/// # Examples
///
/// ```ignore
/// // SET mykey hello PX 1000
/// let result = set(&store, vec![
///     "mykey".to_string(),
///     "hello".to_string(),
///     "PX".to_string(),
///     "1000".to_string(),
/// ]).await;
/// // Returns: "+OK\r\n"
/// ```
pub async fn set(store: &KeyValueStore, arguments: Vec<String>) -> Result<String, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    store
        .set(
            set_arguments.key,
            Value::new(set_arguments.value, set_arguments.expiration),
        )
        .await;

    Ok(RespValue::SimpleString("OK".to_string()).encode())
}
