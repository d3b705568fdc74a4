//! Request decoding for client connections.
//!
//! A request frame is `*<argc>\r\n` followed by `argc` repetitions of
//! `$<len>\r\n<bytes>\r\n`. Decoding is line based: the declared `$<len>` is
//! checked for shape and then discarded, the argument is whatever follows up
//! to the next line terminator.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Errors that end a connection's read loop.
#[derive(Error, Debug)]
pub enum CommandReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("empty command")]
    EmptyCommand,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Reads one line, without its terminator.
///
/// Returns `Ok(None)` when the stream is exhausted before any byte is read.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>, CommandReadError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let number_of_bytes = reader.read_until(b'\n', &mut line).await?;

    if number_of_bytes == 0 {
        return Ok(None);
    }

    if line.ends_with(b"\n") {
        line.pop();
    }
    if line.ends_with(b"\r") {
        line.pop();
    }

    Ok(Some(String::from_utf8(line)?))
}

/// Reads a line that must exist because a frame is still being decoded.
async fn read_frame_line<R>(reader: &mut R) -> Result<String, CommandReadError>
where
    R: AsyncBufRead + Unpin,
{
    read_line(reader)
        .await?
        .ok_or_else(|| CommandReadError::MalformedFrame("unexpected end of stream".to_string()))
}

/// Decodes the next request frame into its ordered arguments.
///
/// The first element is the command name exactly as the client sent it;
/// canonicalization happens in [`crate::commands::CommandHandler::new`].
///
/// # Errors
///
/// * [`CommandReadError::ConnectionClosed`] - the peer closed between frames
/// * [`CommandReadError::MalformedFrame`] - the header is not `*<n>`, an
///   argument header is not `$<len>`, or the stream ends mid-frame
/// * [`CommandReadError::EmptyCommand`] - the frame declared zero arguments
///
/// # Examples
///
/// ```
/// # tokio_test_block_on(async {
/// use redis_streams_server::input::read_command;
///
/// let mut input: &[u8] = b"*2\r\n$4\r\nECHO\r\n$3\r\nhey\r\n";
/// let arguments = read_command(&mut input).await.unwrap();
/// assert_eq!(arguments, vec!["ECHO".to_string(), "hey".to_string()]);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub async fn read_command<R>(reader: &mut R) -> Result<Vec<String>, CommandReadError>
where
    R: AsyncBufRead + Unpin,
{
    let header = loop {
        match read_line(reader).await? {
            None => return Err(CommandReadError::ConnectionClosed),
            // Stray blank lines between frames are tolerated
            Some(line) if line.is_empty() => continue,
            Some(line) => break line,
        }
    };

    let Some(count) = header.strip_prefix('*') else {
        return Err(CommandReadError::MalformedFrame(format!(
            "expected array header, got '{}'",
            header
        )));
    };

    let number_of_arguments = count
        .parse::<usize>()
        .map_err(|_| CommandReadError::MalformedFrame(format!("invalid argument count '{}'", count)))?;

    if number_of_arguments == 0 {
        return Err(CommandReadError::EmptyCommand);
    }

    let mut arguments = Vec::with_capacity(number_of_arguments);

    for _ in 0..number_of_arguments {
        let length_line = read_frame_line(reader).await?;

        if !length_line.starts_with('$') {
            return Err(CommandReadError::MalformedFrame(format!(
                "expected bulk string header, got '{}'",
                length_line
            )));
        }

        arguments.push(read_frame_line(reader).await?);
    }

    Ok(arguments)
}

/// Resolves once the peer has closed its side of the connection.
///
/// Buffered request bytes are never consumed. If the client already sent
/// more data it is clearly still there, so the future stays pending.
pub async fn wait_for_disconnect<R>(reader: &mut R)
where
    R: AsyncBufRead + Unpin,
{
    let closed = match reader.fill_buf().await {
        Ok(buffer) => buffer.is_empty(),
        Err(_) => true,
    };

    if !closed {
        std::future::pending::<()>().await;
    }
}
