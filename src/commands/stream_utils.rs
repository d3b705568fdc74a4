use crate::{
    resp::RespValue,
    stream_store::{RangeEnd, StreamEntry, StreamError, StreamId},
};

/// Parses an XRANGE start: `-`, `<ms>` (sequence 0) or `<ms>-<seq>`.
pub fn parse_range_start(argument: &str) -> Result<StreamId, StreamError> {
    if argument == "-" {
        return Ok(StreamId::ZERO);
    }

    let (ms, seq) = StreamId::parse_partial(argument)?;
    Ok(StreamId::new(ms, seq.unwrap_or(0)))
}

/// Parses an XRANGE end: `+`, `<ms>` (last sequence of that ms) or `<ms>-<seq>`.
pub fn parse_range_end(argument: &str) -> Result<RangeEnd, StreamError> {
    if argument == "+" {
        return Ok(RangeEnd::Unbounded);
    }

    match StreamId::parse_partial(argument)? {
        (ms, Some(seq)) => Ok(RangeEnd::Exact(StreamId::new(ms, seq))),
        (ms, None) => Ok(RangeEnd::Millisecond(ms)),
    }
}

/// Converts stream entries to the RESP shape shared by XRANGE and XREAD:
/// `[[id, [field, value, ...]], ...]`.
///
/// # Examples
///
/// ```ignore
/// let entries = vec![StreamEntry { id: StreamId::new(1, 1), fields: vec!["field".into(), "val".into()] }];
/// let result = parse_stream_entries_to_resp(&entries);
/// // Returns: "*1\r\n*2\r\n$3\r\n1-1\r\n*2\r\n$5\r\nfield\r\n$3\r\nval\r\n"
/// ```
pub fn parse_stream_entries_to_resp(entries: &[StreamEntry]) -> RespValue {
    RespValue::Array(
        entries
            .iter()
            .map(|entry| {
                RespValue::Array(vec![
                    RespValue::BulkString(entry.id.to_string()),
                    RespValue::bulk_string_array(entry.fields.iter().cloned()),
                ])
            })
            .collect(),
    )
}
