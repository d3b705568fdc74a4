//! Reply encoding for the Redis Serialization Protocol (RESP).
//!
//! Requests are decoded line by line in [`crate::input`]; this module only
//! knows how to turn typed replies into the bytes written back to a client.

/// A single RESP reply frame.
///
/// Arrays nest, which is how CONFIG GET pairs, KEYS listings and stream query
/// results are expressed.
#[derive(Debug, PartialEq, Clone)]
pub enum RespValue {
    /// `+<text>\r\n`
    SimpleString(String),
    /// `-<text>\r\n`, the text already carries its `ERR` prefix
    Error(String),
    /// `:<n>\r\n`
    Integer(i64),
    /// `$<len>\r\n<bytes>\r\n`
    BulkString(String),
    /// `$-1\r\n`
    NullBulkString,
    /// `*<n>\r\n` followed by `n` encoded elements
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Encodes the value into its wire representation.
    ///
    /// # Examples
    ///
    /// ```
    /// use redis_streams_server::resp::RespValue;
    ///
    /// let reply = RespValue::Array(vec![
    ///     RespValue::BulkString("dir".to_string()),
    ///     RespValue::BulkString("/tmp".to_string()),
    /// ]);
    /// assert_eq!(reply.encode(), "*2\r\n$3\r\ndir\r\n$4\r\n/tmp\r\n");
    /// ```
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(s) => format!("+{}\r\n", s),
            RespValue::Error(msg) => format!("-{}\r\n", msg),
            RespValue::Integer(n) => format!(":{}\r\n", n),
            RespValue::BulkString(s) => format!("${}\r\n{}\r\n", s.len(), s),
            RespValue::NullBulkString => "$-1\r\n".to_string(),
            RespValue::Array(elements) => {
                let mut encoded = format!("*{}\r\n", elements.len());

                for element in elements {
                    encoded.push_str(&element.encode());
                }

                encoded
            }
        }
    }

    /// Builds an array of bulk strings from anything string-like.
    pub fn bulk_string_array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RespValue::Array(
            items
                .into_iter()
                .map(|item| RespValue::BulkString(item.into()))
                .collect(),
        )
    }
}
