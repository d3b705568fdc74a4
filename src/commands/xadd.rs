use crate::{
    commands::command_error::CommandError,
    resp::RespValue,
    stream_store::{StreamIdSpec, StreamStore},
};

/// Parsed arguments of `XADD <key> <id> <field> <value> [<field> <value> ...]`.
pub struct XaddArguments {
    key: String,
    id: StreamIdSpec,
    fields: Vec<String>,
}

impl XaddArguments {
    /// # Returns
    ///
    /// * `Err(CommandError::InvalidXAddCommand)` - If fewer than 4 arguments are given or a
    ///   field has no value
    /// * `Err(CommandError::Stream(StreamError::InvalidId))` - If the id is not `*`,
    ///   `<ms>-*` or `<ms>-<seq>`
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || arguments.len() % 2 != 0 {
            return Err(CommandError::InvalidXAddCommand);
        }

        let mut arguments = arguments.into_iter();
        let key = arguments.next().unwrap_or_default();
        let id = arguments.next().unwrap_or_default().parse::<StreamIdSpec>()?;

        Ok(Self {
            key,
            id,
            fields: arguments.collect(),
        })
    }
}

/// Handles the XADD command, replying with the id that was stored.
///
/// # Examples
///
/// ```ignore
/// // XADD mystream 1526919030474-* temperature 36
/// let result = xadd(&streams, vec![
///     "mystream".to_string(),
///     "1526919030474-*".to_string(),
///     "temperature".to_string(),
///     "36".to_string(),
/// ]).await;
/// // Returns: "$15\r\n1526919030474-0\r\n"
/// ```
pub async fn xadd(streams: &StreamStore, arguments: Vec<String>) -> Result<String, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;

    let id = streams
        .append(&xadd_arguments.key, xadd_arguments.id, xadd_arguments.fields)
        .await?;

    Ok(RespValue::BulkString(id.to_string()).encode())
}
