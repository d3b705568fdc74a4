use crate::{
    commands::{command_error::CommandError, stream_utils::parse_stream_entries_to_resp},
    resp::RespValue,
    stream_store::{BlockMode, StreamId, StreamStore},
};

/// Where an XREAD starts reading a stream, exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadStart {
    /// `$`: only entries appended after the command arrived
    NewEntriesOnly,
    /// `<ms>` or `<ms>-<seq>`; a bare `<ms>` means `<ms>-0`
    After(StreamId),
}

/// Parsed arguments of `XREAD [BLOCK <ms>] STREAMS <key>... <id>...`.
#[derive(Debug, PartialEq)]
pub struct XreadArguments {
    /// `None` without BLOCK; `Some(0)` blocks without a deadline
    blocking_duration: Option<u64>,
    key_stream_pairs: Vec<(String, ReadStart)>,
}

impl XreadArguments {
    /// Parses the blocking and non-blocking forms. Option names are
    /// case-insensitive.
    ///
    /// # Returns
    ///
    /// * `Err(CommandError::InvalidXReadCommand)` - If no key/id pair follows STREAMS or
    ///   the keys and ids do not pair up
    /// * `Err(CommandError::InvalidXReadBlockDuration)` - If BLOCK is not followed by a
    ///   non-negative integer
    /// * `Err(CommandError::InvalidXReadOption)` - If STREAMS is missing or another option
    ///   is given
    /// * `Err(CommandError::Stream(StreamError::InvalidId))` - If an id is malformed
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // XREAD BLOCK 1000 STREAMS mystream $
    /// let args = XreadArguments::parse(vec![
    ///     "BLOCK".to_string(),
    ///     "1000".to_string(),
    ///     "STREAMS".to_string(),
    ///     "mystream".to_string(),
    ///     "$".to_string(),
    /// ])?;
    /// ```
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 3 {
            return Err(CommandError::InvalidXReadCommand);
        }

        let (blocking_duration, start_data_index) = if arguments[0].eq_ignore_ascii_case("block")
        {
            let duration_ms = arguments[1]
                .parse::<u64>()
                .map_err(|_| CommandError::InvalidXReadBlockDuration)?;

            match arguments.get(2) {
                Some(option) if option.eq_ignore_ascii_case("streams") => {}
                _ => return Err(CommandError::InvalidXReadOption),
            }

            (Some(duration_ms), 3)
        } else if arguments[0].eq_ignore_ascii_case("streams") {
            (None, 1)
        } else {
            return Err(CommandError::InvalidXReadOption);
        };

        let data = &arguments[start_data_index..];

        if data.is_empty() || data.len() % 2 != 0 {
            return Err(CommandError::InvalidXReadCommand);
        }

        let (keys, ids) = data.split_at(data.len() / 2);
        let mut key_stream_pairs = Vec::with_capacity(keys.len());

        for (key, id) in keys.iter().zip(ids) {
            let start = if id == "$" {
                ReadStart::NewEntriesOnly
            } else {
                let (ms, seq) = StreamId::parse_partial(id)?;
                ReadStart::After(StreamId::new(ms, seq.unwrap_or(0)))
            };

            key_stream_pairs.push((key.clone(), start));
        }

        Ok(Self {
            blocking_duration,
            key_stream_pairs,
        })
    }
}

/// Handles the XREAD command.
///
/// Replies with one `[key, entries]` slot per requested key, in request
/// order, as soon as at least one of them has entries. With nothing to
/// return the reply is a null bulk string: immediately without BLOCK, or
/// once the block deadline passes. `$` is resolved once, before waiting.
pub async fn xread(streams: &StreamStore, arguments: Vec<String>) -> Result<String, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;

    let mut queries = Vec::with_capacity(xread_arguments.key_stream_pairs.len());

    for (key, start) in xread_arguments.key_stream_pairs {
        let after = match start {
            ReadStart::NewEntriesOnly => streams.last_id(&key).await.unwrap_or(StreamId::ZERO),
            ReadStart::After(id) => id,
        };

        queries.push((key, after));
    }

    let mode = BlockMode::from_block_millis(xread_arguments.blocking_duration);

    let Some(slots) = streams.read(&queries, mode).await else {
        return Ok(RespValue::NullBulkString.encode());
    };

    let response = slots
        .into_iter()
        .map(|(key, entries)| {
            RespValue::Array(vec![
                RespValue::BulkString(key),
                parse_stream_entries_to_resp(&entries),
            ])
        })
        .collect();

    Ok(RespValue::Array(response).encode())
}
