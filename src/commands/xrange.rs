use crate::{
    commands::{
        command_error::CommandError,
        stream_utils::{parse_range_end, parse_range_start, parse_stream_entries_to_resp},
    },
    stream_store::{RangeEnd, StreamId, StreamStore},
};

/// Parsed arguments of `XRANGE <key> <start> <end>`.
pub struct XrangeArguments {
    key: String,
    start: StreamId,
    end: RangeEnd,
}

impl XrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::InvalidXRangeCommand);
        }

        let start = parse_range_start(&arguments[1])?;
        let end = parse_range_end(&arguments[2])?;

        Ok(Self {
            key: arguments[0].clone(),
            start,
            end,
        })
    }
}

/// Handles the XRANGE command.
///
/// An unknown key is not an error: the reply is an empty array.
pub async fn xrange(streams: &StreamStore, arguments: Vec<String>) -> Result<String, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let entries = streams
        .range(&xrange_arguments.key, xrange_arguments.start, xrange_arguments.end)
        .await;

    Ok(parse_stream_entries_to_resp(&entries).encode())
}
